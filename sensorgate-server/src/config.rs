// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for the gateway

use sensorgate::AggregatorConfig;
use std::time::Duration;

/// API keys accepted when none are configured.
pub const DEFAULT_API_KEYS: &[&str] = &["1234-ABCD-5678", "ZXCV-9999-TEST"];

/// Instruction sent ahead of every chat conversation.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are the assistant of an air and water \
quality monitoring service. Answer questions about sensor readings, pollutants and water \
quality clearly and briefly.";

/// Gateway-level configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the ML prediction service
    pub ml_url: String,

    /// Full URL of the chat generateContent endpoint
    pub chat_url: String,

    /// API key for the chat backend (sent as the `key` query parameter)
    pub chat_api_key: Option<String>,

    /// Identity verifier endpoint; bearer-gated routes reject everything without it
    pub identity_url: Option<String>,

    /// Accepted values of the `x-api-key` header
    pub api_keys: Vec<String>,

    /// Timeout for every upstream call
    pub upstream_timeout: Duration,

    /// Most recent chat turns sent upstream
    pub chat_context_turns: usize,

    /// Messages kept in the in-memory chat log
    pub chat_history_limit: usize,

    /// Chat system instruction
    pub system_instruction: String,

    /// Hourly aggregation settings
    pub aggregator: AggregatorConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ml_url: "http://ml:8000".to_string(),
            chat_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                .to_string(),
            chat_api_key: None,
            identity_url: None,
            api_keys: DEFAULT_API_KEYS.iter().map(|k| k.to_string()).collect(),
            upstream_timeout: Duration::from_secs(10),
            chat_context_turns: 10,
            chat_history_limit: 200,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Exact membership test against the configured API keys.
    pub fn accepts_api_key(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }

    /// Parse a comma-separated key list, skipping blanks.
    pub fn parse_api_keys(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_config_default() {
        let config = GatewayConfig::default();
        assert_eq!(config.chat_context_turns, 10);
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert_eq!(config.aggregator.max_hours, 19);
        assert!(config.accepts_api_key("1234-ABCD-5678"));
        assert!(config.accepts_api_key("ZXCV-9999-TEST"));
    }

    #[test]
    fn test_api_key_exact_match() {
        let config = GatewayConfig::default();
        assert!(!config.accepts_api_key("1234-abcd-5678"));
        assert!(!config.accepts_api_key("1234-ABCD-5678 "));
        assert!(!config.accepts_api_key(""));
    }

    #[test]
    fn test_parse_api_keys() {
        assert_eq!(
            GatewayConfig::parse_api_keys("a, b,,c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(GatewayConfig::parse_api_keys(" , ").is_empty());
    }
}
