// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Application state shared across handlers.

use sensorgate::{RegionTable, SensorCatalog};
use std::time::Instant;
use tokio::sync::Mutex;

use crate::chat::ChatLog;
use crate::config::GatewayConfig;
use crate::upstream::{http_client, ChatClient, IdentityClient, PredictionClient};

pub struct AppState {
    pub config: GatewayConfig,
    pub catalog: SensorCatalog,
    pub regions: RegionTable,
    pub ml: PredictionClient,
    pub chat: ChatClient,
    pub identity: IdentityClient,
    pub chat_log: Mutex<ChatLog>,
    pub start_time: Instant,
}

impl AppState {
    /// Build the state with the standard catalog and region tables.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let http = http_client(config.upstream_timeout)?;

        Ok(Self {
            ml: PredictionClient::new(http.clone(), config.ml_url.clone()),
            chat: ChatClient::new(
                http.clone(),
                config.chat_url.clone(),
                config.chat_api_key.clone(),
                config.system_instruction.clone(),
            ),
            identity: IdentityClient::new(http, config.identity_url.clone()),
            chat_log: Mutex::new(ChatLog::new(config.chat_history_limit)),
            catalog: SensorCatalog::standard(),
            regions: RegionTable::standard(),
            start_time: Instant::now(),
            config,
        })
    }
}
