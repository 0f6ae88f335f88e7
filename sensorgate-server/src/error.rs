// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the HTTP layer.
//!
//! Every handler returns [`ApiError`] on failure; it renders as a JSON body
//! `{"error": "..."}` with the matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sensorgate::{SensorGateError, ValidationError};
use serde_json::json;
use thiserror::Error;

use crate::metrics;

/// Failures talking to an external backend.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Request could not be sent or the body could not be read
    #[error("{backend} request failed: {source}")]
    Transport {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-success status
    #[error("{backend} returned status {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    /// Backend answered with something we could not use
    #[error("{backend} returned an unexpected payload: {reason}")]
    Malformed {
        backend: &'static str,
        reason: String,
    },

    /// Backend is not configured
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl UpstreamError {
    /// Backend name, used as a metrics label.
    pub fn backend(&self) -> &'static str {
        match self {
            UpstreamError::Transport { backend, .. }
            | UpstreamError::Status { backend, .. }
            | UpstreamError::Malformed { backend, .. } => backend,
            UpstreamError::NotConfigured(backend) => backend,
        }
    }
}

/// Main error type for HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request; the message names the offending field
    #[error("{0}")]
    Validation(String),

    /// Missing or rejected credentials
    #[error("{0}")]
    Unauthorized(String),

    /// An external backend failed; `public` is what the caller sees
    #[error("{public}")]
    Upstream {
        public: String,
        #[source]
        source: UpstreamError,
    },

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
}

impl From<SensorGateError> for ApiError {
    fn from(err: SensorGateError) -> Self {
        match err {
            SensorGateError::Validation(v) => ApiError::Validation(v.to_string()),
            SensorGateError::Export(msg) => ApiError::Internal(format!("Export failed: {msg}")),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Validation(msg) => {
                metrics::record_validation_failure();
                tracing::debug!("Rejected request: {}", msg);
            }
            ApiError::Unauthorized(msg) => tracing::debug!("Unauthorized: {}", msg),
            ApiError::Upstream { source, .. } => {
                metrics::record_upstream_failure(source.backend());
                tracing::error!("Upstream failure: {}", source);
            }
            ApiError::Internal(msg) => tracing::error!("Internal error: {}", msg),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let upstream = ApiError::Upstream {
            public: "Failed".into(),
            source: UpstreamError::NotConfigured("ml"),
        };
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.to_string(), "Failed");
    }

    #[test]
    fn test_core_validation_maps_to_bad_request() {
        let core = SensorGateError::Validation(ValidationError::UnsupportedSensor {
            sensor: "not_a_sensor".into(),
            domain: "air".into(),
        });
        let api: ApiError = core.into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert!(api.to_string().contains("not_a_sensor"));
    }

    #[test]
    fn test_upstream_backend_label() {
        let err = UpstreamError::Status {
            backend: "chat",
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.backend(), "chat");
        assert!(err.to_string().contains("503"));
    }
}
