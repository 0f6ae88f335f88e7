// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! In-memory chat log.
//!
//! Holds the conversation shown by `GET /api/chat`, oldest first. The log is
//! bounded; when full, the oldest messages are dropped. Only the most recent
//! turns are sent to the chat backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Greeting the log starts with.
pub const GREETING: &str = "Hello! How can I help you today?";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Bounded conversation log with monotonically increasing ids.
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    next_id: u64,
    limit: usize,
}

impl ChatLog {
    /// Create a log holding at most `limit` messages, seeded with [`GREETING`].
    pub fn new(limit: usize) -> Self {
        let mut log = Self {
            messages: VecDeque::new(),
            next_id: 1,
            limit: limit.max(1),
        };
        log.append(Sender::Bot, GREETING, None);
        log
    }

    /// Append a message, evicting the oldest ones past the limit.
    pub fn push(&mut self, sender: Sender, message: &str, timestamp: DateTime<Utc>) -> ChatMessage {
        self.append(sender, message, Some(timestamp))
    }

    fn append(&mut self, sender: Sender, message: &str, timestamp: Option<DateTime<Utc>>) -> ChatMessage {
        let entry = ChatMessage {
            id: self.next_id,
            sender,
            message: message.to_string(),
            timestamp,
        };
        self.next_id += 1;
        self.messages.push_back(entry.clone());
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
        entry
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// Every message held, oldest first.
    pub fn all(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
