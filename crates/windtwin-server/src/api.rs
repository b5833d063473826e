// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of WindTwin.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use windtwin_core::{
    BatchReport, EntitySnapshot, ErrorAggregator, ForecastSource, PredictionService,
    SensorEventHandler, SensorStateListener, TwinEventSender,
};
use windtwin_types::{
    ErrorWindow, ForecastPoint, PowerResult, PowerResultSet, SensorUpdated, TelemetryEvent,
    TurbineConditions, TwinEvent,
};

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    pub predictions: PredictionService,
    pub forecast: Arc<dyn ForecastSource>,
    pub pipeline: Arc<SensorEventHandler>,
    pub events: TwinEventSender,
    pub aggregator: Arc<ErrorAggregator>,
    pub sensors: Arc<SensorStateListener>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("forecast", &self.forecast.name())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Error response carrying a plain-text message
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
        };
        (status, message).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RawPredictionRequest {
    #[serde(rename = "powerInputs")]
    pub power_inputs: Vec<TurbineConditions>,
}

#[derive(Debug, Serialize)]
pub struct RawPredictionResult {
    pub result: PowerResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsResponse {
    pub current_errors: Vec<ErrorWindow>,
    pub error_list: Vec<ErrorWindow>,
}

#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub enabled: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/predictions", post(predict_raw))
        .route(
            "/api/predictions/forecast",
            post(predict_forecast).get(predict_forecast_feed),
        )
        .route("/api/telemetry", post(ingest_telemetry))
        .route("/api/twin-events", post(twin_event))
        .route("/api/errors", get(list_errors))
        .route("/api/errors/{entity}", get(entity_errors))
        .route("/api/errors/{entity}/simulation", post(set_simulation))
        .route("/api/sensors/{turbine}", get(sensor_state))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn predict_raw(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<RawPredictionResult>>, ApiError> {
    let request: RawPredictionRequest = parse_body(&body)?;
    debug!("Raw prediction for {} inputs", request.power_inputs.len());

    let results = state
        .predictions
        .predict_conditions(&request.power_inputs)
        .await
        .into_iter()
        .map(|result| RawPredictionResult { result })
        .collect();
    Ok(Json(results))
}

async fn predict_forecast(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PowerResultSet>, ApiError> {
    let forecast: Vec<ForecastPoint> = parse_body(&body)?;
    state
        .predictions
        .predict_forecast(&forecast)
        .await
        .map(Json)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn predict_forecast_feed(
    State(state): State<AppState>,
) -> Result<Json<PowerResultSet>, ApiError> {
    state
        .predictions
        .predict_from_source(state.forecast.as_ref())
        .await
        .map(Json)
        .map_err(|e| {
            warn!("Forecast prediction failed: {}", e);
            ApiError::BadRequest(e.to_string())
        })
}

async fn ingest_telemetry(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BatchReport>, ApiError> {
    let events: Vec<TelemetryEvent> = parse_body(&body)?;
    Ok(Json(state.pipeline.handle_batch(&events).await))
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn twin_event(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let document: serde_json::Value = parse_body(&body)?;
    let event =
        TwinEvent::from_notification(&document).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state
        .events
        .publish(event)
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;
    Ok(StatusCode::ACCEPTED)
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn list_errors(State(state): State<AppState>) -> Json<ErrorsResponse> {
    Json(ErrorsResponse {
        current_errors: state.aggregator.current_errors(),
        error_list: state.aggregator.error_list(),
    })
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn entity_errors(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<EntitySnapshot>, ApiError> {
    state
        .aggregator
        .entity_snapshot(&entity)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no readings for {entity}")))
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn set_simulation(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    body: Bytes,
) -> Result<Json<EntitySnapshot>, ApiError> {
    let request: SimulationRequest = parse_body(&body)?;
    state
        .aggregator
        .set_error_simulation(&entity, request.enabled);
    state
        .aggregator
        .entity_snapshot(&entity)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no readings for {entity}")))
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
async fn sensor_state(
    State(state): State<AppState>,
    Path(turbine): Path<String>,
) -> Result<Json<SensorUpdated>, ApiError> {
    state
        .sensors
        .latest(&turbine)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no sensor state for {turbine}")))
}
