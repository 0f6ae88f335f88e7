// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Clients for the external backends.
//!
//! Three backends are relayed to: the ML prediction service, the chat model
//! and the identity verifier. All of them share one `reqwest::Client`, so the
//! connection pool and the timeout are configured once.

use reqwest::Client;
use sensorgate::{Domain, FeatureContribution};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::auth::Identity;
use crate::chat::{ChatMessage, Sender};
use crate::error::UpstreamError;

const ML_BACKEND: &str = "ml";
const CHAT_BACKEND: &str = "chat";
const IDENTITY_BACKEND: &str = "identity";

/// Error code the identity verifier uses for expired tokens.
pub const TOKEN_EXPIRED_CODE: &str = "auth/id-token-expired";

/// Build the shared HTTP client.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Send a JSON POST and return the body of a 2xx response.
async fn post_json(
    backend: &'static str,
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<String, UpstreamError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|source| UpstreamError::Transport { backend, source })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| UpstreamError::Transport { backend, source })?;

    if !status.is_success() {
        return Err(UpstreamError::Status {
            backend,
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}

fn parse<T: for<'de> Deserialize<'de>>(backend: &'static str, text: &str) -> Result<T, UpstreamError> {
    serde_json::from_str(text).map_err(|e| UpstreamError::Malformed {
        backend,
        reason: e.to_string(),
    })
}

// ============================================================================
// ML prediction
// ============================================================================

/// Raw answer of the ML service.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub prediction: Value,
    #[serde(default)]
    pub probabilities: Value,
    #[serde(default)]
    pub top_features: Option<Vec<FeatureContribution>>,
}

/// Client for `POST <base>/predict-<domain>-monitoring`.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Endpoint for a domain.
    pub fn endpoint(&self, domain: Domain) -> String {
        format!(
            "{}/predict-{}-monitoring",
            self.base_url.trim_end_matches('/'),
            domain
        )
    }

    /// Relay a feature vector.
    pub async fn predict(&self, domain: Domain, features: &[f64]) -> Result<Prediction, UpstreamError> {
        let request = self.http.post(self.endpoint(domain));
        let text = post_json(ML_BACKEND, request, &json!({ "features": features })).await?;
        parse(ML_BACKEND, &text)
    }
}

// ============================================================================
// Chat model
// ============================================================================

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for a generateContent-style chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    system_instruction: String,
}

impl ChatClient {
    pub fn new(
        http: Client,
        url: impl Into<String>,
        api_key: Option<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            system_instruction: system_instruction.into(),
        }
    }

    /// Request body for a conversation window.
    ///
    /// Leading bot turns are skipped; the model expects the user to speak first.
    pub fn payload(&self, history: &[ChatMessage]) -> Value {
        let contents: Vec<Content<'_>> = history
            .iter()
            .skip_while(|m| m.sender == Sender::Bot)
            .map(|m| Content {
                role: match m.sender {
                    Sender::User => "user",
                    Sender::Bot => "model",
                },
                parts: vec![Part { text: &m.message }],
            })
            .collect();

        json!({
            "systemInstruction": { "parts": [{ "text": self.system_instruction }] },
            "contents": contents,
        })
    }

    /// Ask the model for the next bot turn.
    pub async fn generate(&self, history: &[ChatMessage]) -> Result<String, UpstreamError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured(CHAT_BACKEND))?;

        let request = self.http.post(&self.url).query(&[("key", key)]);
        let text = post_json(CHAT_BACKEND, request, &self.payload(history)).await?;
        let response: GenerateResponse = parse(CHAT_BACKEND, &text)?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| UpstreamError::Malformed {
                backend: CHAT_BACKEND,
                reason: "no candidate text".to_string(),
            })
    }
}

// ============================================================================
// Identity verifier
// ============================================================================

/// Why a bearer token was not accepted.
#[derive(Debug)]
pub enum TokenRejection {
    /// The verifier reported the token as expired
    Expired,
    /// The verifier rejected the token
    Invalid,
    /// The verifier could not be reached or answered nonsense
    Unavailable(UpstreamError),
}

#[derive(Debug, Deserialize)]
struct VerifierError {
    code: Option<String>,
}

/// Client for the identity verifier (`{token}` → `{uid, email}`).
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: Client,
    url: Option<String>,
}

impl IdentityClient {
    pub fn new(http: Client, url: Option<String>) -> Self {
        Self { http, url }
    }

    /// Verify a bearer token.
    pub async fn verify(&self, token: &str) -> Result<Identity, TokenRejection> {
        let url = self
            .url
            .as_deref()
            .ok_or(TokenRejection::Unavailable(UpstreamError::NotConfigured(
                IDENTITY_BACKEND,
            )))?;

        let request = self.http.post(url);
        match post_json(IDENTITY_BACKEND, request, &json!({ "token": token })).await {
            Ok(text) => parse(IDENTITY_BACKEND, &text).map_err(TokenRejection::Unavailable),
            Err(UpstreamError::Status { status, body, .. }) if status < 500 => {
                let expired = serde_json::from_str::<VerifierError>(&body)
                    .ok()
                    .and_then(|e| e.code)
                    .is_some_and(|code| code == TOKEN_EXPIRED_CODE);
                Err(if expired {
                    TokenRejection::Expired
                } else {
                    TokenRejection::Invalid
                })
            }
            Err(e) => Err(TokenRejection::Unavailable(e)),
        }
    }
}
