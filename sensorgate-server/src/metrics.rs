// SensorGate Server - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for the gateway.
//!
//! This module defines all Prometheus metrics exposed at `/metrics` and the
//! helpers handlers use to update them.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, CounterVec, Encoder, Gauge,
    IntCounter, TextEncoder,
};

lazy_static! {
    // ============================================================
    // Request Metrics
    // ============================================================

    /// Requests handled, labeled by route name.
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "sensorgate_requests_total",
        "Requests handled by route",
        &["route"]
    ).unwrap();

    /// Requests rejected as invalid (HTTP 400).
    pub static ref VALIDATION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "sensorgate_validation_failures_total",
        "Requests rejected by validation"
    ).unwrap();

    /// Requests rejected by the API key or bearer gate.
    pub static ref AUTH_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "sensorgate_auth_failures_total",
        "Requests rejected by authentication",
        &["gate"]
    ).unwrap();

    // ============================================================
    // Simulation Metrics
    // ============================================================

    /// Simulated values produced, labeled by domain.
    pub static ref SIMULATED_VALUES_TOTAL: CounterVec = register_counter_vec!(
        "sensorgate_simulated_values_total",
        "Simulated sensor values produced",
        &["domain"]
    ).unwrap();

    // ============================================================
    // Upstream Metrics
    // ============================================================

    /// Failed calls to external backends, labeled by backend.
    pub static ref UPSTREAM_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "sensorgate_upstream_failures_total",
        "Failed calls to external backends",
        &["backend"]
    ).unwrap();

    /// Messages currently held in the chat log.
    pub static ref CHAT_LOG_MESSAGES: Gauge = register_gauge!(
        "sensorgate_chat_log_messages",
        "Messages currently held in the chat log"
    ).unwrap();
}

/// Count a handled request.
pub fn record_request(route: &str) {
    REQUESTS_TOTAL.with_label_values(&[route]).inc();
}

/// Count a validation failure.
pub fn record_validation_failure() {
    VALIDATION_FAILURES_TOTAL.inc();
}

/// Count a rejected credential.
pub fn record_auth_failure(gate: &str) {
    AUTH_FAILURES_TOTAL.with_label_values(&[gate]).inc();
}

/// Count simulated values.
pub fn record_simulated(domain: &str, count: usize) {
    SIMULATED_VALUES_TOTAL
        .with_label_values(&[domain])
        .inc_by(count as f64);
}

/// Count a failed backend call.
pub fn record_upstream_failure(backend: &str) {
    UPSTREAM_FAILURES_TOTAL.with_label_values(&[backend]).inc();
}

/// Update chat log size.
pub fn update_chat_log_size(len: usize) {
    CHAT_LOG_MESSAGES.set(len as f64);
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        record_request("health");
        record_simulated("air", 19);
        record_upstream_failure("ml");
        update_chat_log_size(3);

        let output = encode_metrics();
        assert!(output.contains("sensorgate_requests_total"));
        assert!(output.contains("sensorgate_simulated_values_total"));
        assert!(output.contains("sensorgate_chat_log_messages"));
    }

    #[test]
    fn test_counters_increase() {
        let before = SIMULATED_VALUES_TOTAL.with_label_values(&["water"]).get();
        record_simulated("water", 5);
        let after = SIMULATED_VALUES_TOTAL.with_label_values(&["water"]).get();
        assert!(after - before >= 5.0);
    }
}
