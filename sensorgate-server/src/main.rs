// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # SensorGate Server
//!
//! ## Usage
//!
//! ```bash
//! # Defaults: port 3000, ML service at http://ml:8000
//! sensorgate-server
//!
//! # Custom backends
//! GEMINI_API_KEY=... sensorgate-server --ml-url http://localhost:8000 \
//!     --identity-url http://localhost:9099/verify
//! ```

use clap::Parser;
use sensorgate_server::{router, AppState, GatewayConfig};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// SensorGate HTTP gateway
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Base URL of the ML prediction service
    #[arg(long, env = "ML_URL", default_value = "http://ml:8000")]
    ml_url: String,

    /// Chat generateContent endpoint
    #[arg(long, env = "CHAT_URL")]
    chat_url: Option<String>,

    /// Chat backend API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    chat_api_key: Option<String>,

    /// Identity verifier endpoint for bearer tokens
    #[arg(long, env = "IDENTITY_URL")]
    identity_url: Option<String>,

    /// Accepted API keys, comma-separated
    #[arg(long, env = "API_KEYS")]
    api_keys: Option<String>,

    /// Timeout for upstream calls, in seconds
    #[arg(long, default_value = "10")]
    upstream_timeout_secs: u64,

    /// Chat turns sent to the model
    #[arg(long, default_value = "10")]
    chat_context_turns: usize,

    /// Messages kept in the chat log
    #[arg(long, default_value = "200")]
    chat_history_limit: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> GatewayConfig {
        let mut config = GatewayConfig {
            ml_url: self.ml_url,
            chat_api_key: self.chat_api_key,
            identity_url: self.identity_url,
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
            chat_context_turns: self.chat_context_turns,
            chat_history_limit: self.chat_history_limit,
            ..GatewayConfig::default()
        };
        if let Some(url) = self.chat_url {
            config.chat_url = url;
        }
        if let Some(keys) = self.api_keys.as_deref().map(GatewayConfig::parse_api_keys) {
            if !keys.is_empty() {
                config.api_keys = keys;
            }
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("SensorGate Server v{}", env!("CARGO_PKG_VERSION"));

    let port = args.port;
    let config = args.into_config();

    if config.chat_api_key.is_none() {
        tracing::warn!("No chat API key configured, chat replies will be canned");
    }
    if config.identity_url.is_none() {
        tracing::warn!("No identity verifier configured, bearer-gated routes will reject all requests");
    }

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting server on http://{}", addr);
    info!("Metrics endpoint: http://{}/metrics", addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutting down");
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
