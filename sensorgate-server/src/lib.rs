// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # SensorGate Server
//!
//! HTTP gateway over the `sensorgate` core: sensor catalogs, simulated
//! readings, trends and alerts, hourly company series with CSV export, and
//! relays to an ML prediction service and a chat model.
//!
//! Routes under `/api/alerts`, `/api/nearby` and `/api/company` require an
//! `x-api-key` header; `/api/predict` and `/api/me` require a bearer token.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod upstream;

pub use auth::Identity;
pub use chat::{ChatLog, ChatMessage, Sender};
pub use config::GatewayConfig;
pub use error::{ApiError, UpstreamError};
pub use routes::router;
pub use state::AppState;
