// SensorGate Server - HTTP gateway
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Router and request handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sensorgate::{
    classify_status, filter_by_radius, find_alerts, generate_trend, parse_date, simplify_optional,
    simulate_reading, to_csv, CompanyAggregate, CompanyAggregator, CompanyRequest, Domain,
    Exceedance, FeatureContribution, SensorCatalogEntry, SensorReading, Status, TrendPoint,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{require_api_key, require_bearer, Identity};
use crate::chat::{ChatMessage, Sender};
use crate::error::{ApiError, UpstreamError};
use crate::metrics::{self, encode_metrics};
use crate::state::AppState;

pub const PREDICTION_FAILED: &str = "Failed to get prediction from ML service";
pub const EMPTY_CHAT_MESSAGE: &str = "Message content is required.";
pub const CHAT_REPLY_MESSAGE: &str = "Message processed and response generated!";

const CHAT_UNCONFIGURED_REPLY: &str =
    "I can't connect to my brain right now. Please ensure the API key is configured correctly.";
const CHAT_KEY_REJECTED_REPLY: &str =
    "I can't connect to my brain right now. Please check the API key configuration.";
const CHAT_MALFORMED_REPLY: &str =
    "I'm having a little trouble understanding or generating a response. Could you rephrase that?";
const CHAT_FAILED_REPLY: &str =
    "I'm sorry, I encountered an internal error and cannot respond at the moment.";

type ApiResult<T> = Result<T, ApiError>;

/// Build the full router.
pub fn router(state: Arc<AppState>) -> Router {
    let keyed = Router::new()
        .route("/api/alerts", post(alerts_handler))
        .route("/api/nearby", post(nearby_handler))
        .route("/api/company/:domain", post(company_handler))
        .route("/api/company/:domain/csv", post(company_csv_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    let authenticated = Router::new()
        .route("/api/predict", post(predict_handler))
        .route("/api/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .route("/api/sensors/:domain", get(sensors_handler))
        .route("/api/simulate/:domain/:sensor", get(simulate_handler))
        .route("/api/trend", get(trend_handler))
        .route("/api/chat", get(chat_history_handler).post(chat_handler))
        .merge(keyed)
        .merge(authenticated)
        .with_state(state)
}

/// Unwrap a JSON body, turning extractor rejections into 400s with our body shape.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(v)| v)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// Same as [`json_body`] for query strings.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(v)| v)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

fn parse_domain(raw: &str) -> ApiResult<Domain> {
    Ok(raw.parse::<Domain>()?)
}

// ============================================================================
// Service endpoints
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        encode_metrics(),
    )
}

#[derive(Serialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    chat_messages: usize,
    regions: Vec<String>,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let chat_messages = state.chat_log.lock().await.len();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        chat_messages,
        regions: state.regions.names().into_iter().map(String::from).collect(),
    })
}

// ============================================================================
// Catalog and simulation
// ============================================================================

async fn sensors_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_domain): Path<String>,
) -> ApiResult<Json<Vec<SensorCatalogEntry>>> {
    metrics::record_request("sensors");
    let domain = parse_domain(&raw_domain)?;
    Ok(Json(state.catalog.sensors(domain).cloned().collect()))
}

#[derive(Debug, Deserialize)]
struct PositionQuery {
    lat: Option<f64>,
    long: Option<f64>,
}

#[derive(Serialize)]
struct SimulatedReading {
    #[serde(flatten)]
    reading: SensorReading,
    unit: String,
    status: Option<Status>,
}

async fn simulate_handler(
    State(state): State<Arc<AppState>>,
    Path((raw_domain, sensor)): Path<(String, String)>,
    position: Result<Query<PositionQuery>, QueryRejection>,
) -> ApiResult<Json<SimulatedReading>> {
    metrics::record_request("simulate");
    let position = query_params(position)?;
    let domain = parse_domain(&raw_domain)?;
    state.catalog.validate(&sensor, domain)?;

    let lat = position.lat.ok_or_else(|| ValidationError::MissingField("lat".into()))?;
    let long = position.long.ok_or_else(|| ValidationError::MissingField("long".into()))?;

    let mut rng = StdRng::from_entropy();
    let reading = simulate_reading(&sensor, domain, lat, long, Utc::now(), &mut rng);
    metrics::record_simulated(domain.as_str(), 1);

    Ok(Json(SimulatedReading {
        unit: state.catalog.unit(&sensor, domain).unwrap_or_default().to_string(),
        status: reading.value.map(classify_status),
        reading,
    }))
}

#[derive(Debug, Deserialize)]
struct TrendQuery {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

async fn trend_handler(query: Result<Query<TrendQuery>, QueryRejection>) -> ApiResult<Json<Vec<TrendPoint>>> {
    metrics::record_request("trend");
    let query = query_params(query)?;
    let start = parse_date("start", &query.start)?;
    let end = parse_date("end", &query.end)?;

    let mut rng = StdRng::from_entropy();
    let trend = generate_trend(start, end, &mut rng);
    debug!("Trend {} .. {}: {} points", start, end, trend.len());
    Ok(Json(trend))
}

// ============================================================================
// Alerts and proximity (API key)
// ============================================================================

#[derive(Debug, Deserialize)]
struct AlertRequest {
    sensor: String,
    /// Narrows the sensor check to one domain; otherwise either domain will do.
    #[serde(default)]
    domain: Option<String>,
    threshold: f64,
    location: String,
    #[serde(default)]
    readings: Vec<SensorReading>,
}

fn validate_alert_sensor(state: &AppState, request: &AlertRequest) -> ApiResult<()> {
    if let Some(raw) = request.domain.as_deref() {
        state.catalog.validate(&request.sensor, parse_domain(raw)?)?;
        return Ok(());
    }
    let known = [Domain::Air, Domain::Water]
        .into_iter()
        .any(|d| state.catalog.is_supported(&request.sensor, d));
    if !known {
        return Err(ValidationError::UnsupportedSensor {
            sensor: request.sensor.clone(),
            domain: "air or water".to_string(),
        }
        .into());
    }
    Ok(())
}

async fn alerts_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AlertRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Exceedance>>> {
    metrics::record_request("alerts");
    let request = json_body(body)?;
    validate_alert_sensor(&state, &request)?;
    let alerts = find_alerts(
        &request.readings,
        &request.sensor,
        request.threshold,
        &request.location,
        &state.regions,
    )?;
    info!(
        "{} alerts for {} above {} in {}",
        alerts.len(),
        request.sensor,
        request.threshold,
        request.location
    );
    Ok(Json(alerts))
}

#[derive(Debug, Deserialize)]
struct NearbyRequest {
    lat: f64,
    long: f64,
    radius_km: f64,
    #[serde(default)]
    readings: Vec<SensorReading>,
}

async fn nearby_handler(body: Result<Json<NearbyRequest>, JsonRejection>) -> ApiResult<Json<Vec<SensorReading>>> {
    metrics::record_request("nearby");
    let request = json_body(body)?;
    if !request.radius_km.is_finite() || request.radius_km < 0.0 {
        return Err(ValidationError::invalid("radius_km", "must be a non-negative number").into());
    }
    Ok(Json(filter_by_radius(
        &request.readings,
        request.lat,
        request.long,
        request.radius_km,
    )))
}

// ============================================================================
// Company aggregation (API key)
// ============================================================================

fn aggregate_company(state: &AppState, raw_domain: &str, request: &CompanyRequest) -> ApiResult<CompanyAggregate> {
    let domain = parse_domain(raw_domain)?;
    let aggregator = CompanyAggregator::with_config(&state.catalog, state.config.aggregator);
    let mut rng = StdRng::from_entropy();
    let aggregate = aggregator.aggregate(request, domain, Utc::now(), &mut rng)?;

    metrics::record_simulated(domain.as_str(), aggregate.point_count());
    info!(
        "Aggregated {} {} sensors for {} at hour {}",
        aggregate.sensors.len(),
        domain,
        aggregate.company,
        aggregate.current_hour
    );
    Ok(aggregate)
}

async fn company_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_domain): Path<String>,
    body: Result<Json<CompanyRequest>, JsonRejection>,
) -> ApiResult<Json<CompanyAggregate>> {
    metrics::record_request("company");
    let request = json_body(body)?;
    Ok(Json(aggregate_company(&state, &raw_domain, &request)?))
}

async fn company_csv_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_domain): Path<String>,
    body: Result<Json<CompanyRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    metrics::record_request("company_csv");
    let request = json_body(body)?;
    let aggregate = aggregate_company(&state, &raw_domain, &request)?;
    let export = to_csv(&aggregate)?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (CONTENT_DISPOSITION, export.content_disposition()),
        ],
        export.content,
    ))
}

// ============================================================================
// ML relay (bearer)
// ============================================================================

#[derive(Debug, Deserialize)]
struct PredictQuery {
    domain: Option<String>,
}

#[derive(Serialize)]
struct PredictResponse {
    prediction: Value,
    probabilities: Value,
    top_features: Vec<FeatureContribution>,
}

/// `features` must be a JSON array of numbers.
fn feature_vector(body: &Value) -> ApiResult<Vec<f64>> {
    let Some(Value::Array(items)) = body.get("features") else {
        return Err(ApiError::validation("'features' must be an array"));
    };
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| ApiError::validation("'features' must be an array of numbers"))
        })
        .collect()
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<PredictQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<PredictResponse>> {
    metrics::record_request("predict");
    let query = query_params(query)?;
    let body = json_body(body)?;
    let domain = match query.domain.as_deref() {
        Some(raw) => parse_domain(raw)?,
        None => Domain::Air,
    };
    let features = feature_vector(&body)?;

    debug!("{} requested a {} prediction ({} features)", identity.uid, domain, features.len());
    let prediction = state
        .ml
        .predict(domain, &features)
        .await
        .map_err(|source| ApiError::Upstream {
            public: PREDICTION_FAILED.to_string(),
            source,
        })?;

    Ok(Json(PredictResponse {
        top_features: simplify_optional(prediction.top_features.as_deref()),
        prediction: prediction.prediction,
        probabilities: prediction.probabilities,
    }))
}

async fn me_handler(Extension(identity): Extension<Identity>) -> Json<Identity> {
    metrics::record_request("me");
    Json(identity)
}

// ============================================================================
// Chat relay
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    message: &'static str,
    user_message: ChatMessage,
    bot_message: ChatMessage,
    chat_history: Vec<ChatMessage>,
}

fn fallback_reply(err: &UpstreamError) -> &'static str {
    match err {
        UpstreamError::NotConfigured(_) => CHAT_UNCONFIGURED_REPLY,
        UpstreamError::Status {
            status: 400 | 401 | 403,
            ..
        } => CHAT_KEY_REJECTED_REPLY,
        UpstreamError::Malformed { .. } => CHAT_MALFORMED_REPLY,
        UpstreamError::Transport { .. } | UpstreamError::Status { .. } => CHAT_FAILED_REPLY,
    }
}

async fn chat_history_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ChatMessage>> {
    metrics::record_request("chat_history");
    Json(state.chat_log.lock().await.all())
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    metrics::record_request("chat");
    let request = json_body(body)?;
    let text = request.message.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::validation(EMPTY_CHAT_MESSAGE));
    }

    // The log lock is released before the upstream call.
    let (user_message, context) = {
        let mut log = state.chat_log.lock().await;
        let user_message = log.push(Sender::User, text, Utc::now());
        (user_message, log.recent(state.config.chat_context_turns))
    };

    let reply = match state.chat.generate(&context).await {
        Ok(reply) => reply,
        Err(e) => {
            metrics::record_upstream_failure(e.backend());
            warn!("Chat backend failed: {}", e);
            fallback_reply(&e).to_string()
        }
    };

    let (bot_message, chat_history) = {
        let mut log = state.chat_log.lock().await;
        let bot_message = log.push(Sender::Bot, &reply, Utc::now());
        metrics::update_chat_log_size(log.len());
        (bot_message, log.all())
    };

    Ok(Json(ChatResponse {
        message: CHAT_REPLY_MESSAGE,
        user_message,
        bot_message,
        chat_history,
    }))
}
