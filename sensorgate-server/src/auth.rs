// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Request gates.
//!
//! Two middlewares guard routes: a static API key in `x-api-key`, and a
//! bearer token checked by the identity verifier. A verified bearer request
//! carries the caller's [`Identity`] as a request extension.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use crate::upstream::TokenRejection;

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

pub const INVALID_API_KEY: &str = "Unauthorized. Invalid API key.";
pub const MISSING_TOKEN: &str = "No token provided or invalid format.";
pub const INVALID_TOKEN: &str = "Unauthorized. Invalid token.";
pub const EXPIRED_TOKEN: &str = "Token expired. Please re-authenticate.";

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Reject requests whose `x-api-key` is not in the allow-list.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let accepted = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| state.config.accepts_api_key(key));

    if !accepted {
        metrics::record_auth_failure("api_key");
        return Err(ApiError::unauthorized(INVALID_API_KEY));
    }
    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the bearer token and attach the caller's [`Identity`].
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(String::from);

    let Some(token) = token else {
        metrics::record_auth_failure("bearer");
        return Err(ApiError::unauthorized(MISSING_TOKEN));
    };

    match state.identity.verify(&token).await {
        Ok(identity) => {
            tracing::debug!("Verified caller {}", identity.uid);
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(rejection) => {
            metrics::record_auth_failure("bearer");
            Err(match rejection {
                TokenRejection::Expired => ApiError::unauthorized(EXPIRED_TOKEN),
                TokenRejection::Invalid => ApiError::unauthorized(INVALID_TOKEN),
                TokenRejection::Unavailable(e) => {
                    metrics::record_upstream_failure(e.backend());
                    tracing::warn!("Token verification failed: {}", e);
                    ApiError::unauthorized(INVALID_TOKEN)
                }
            })
        }
    }
}
