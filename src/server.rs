//! HTTP service boundary.
//!
//! Accepts one applicant record per request, delegates to the predictor, and
//! translates domain errors into HTTP failures. The process only reaches
//! this layer after the predictor has loaded successfully, so every handler
//! runs against a fully initialized model.

use crate::error::ScoringError;
use crate::metrics::ServiceMetrics;
use crate::model::Predictor;
use crate::types::{ApplicantRecord, PredictionResult};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub metrics: Arc<ServiceMetrics>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
}

/// Bind the listener and serve until shutdown.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening for prediction requests");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn root() -> Redirect {
    Redirect::temporary("/health")
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn predict(
    State(state): State<AppState>,
    Json(record): Json<ApplicantRecord>,
) -> Result<Json<PredictionResult>, ApiError> {
    let start = Instant::now();

    match state.predictor.predict(&record) {
        Ok(result) => {
            state
                .metrics
                .record_prediction(start.elapsed(), result.label, result.probability);
            debug!(
                label = ?result.label,
                probability = result.probability,
                latency_us = start.elapsed().as_micros() as u64,
                "Prediction served"
            );
            Ok(Json(result))
        }
        Err(e) => {
            state.metrics.record_failure();
            error!(error = %e, "Prediction failed");
            Err(ApiError(e))
        }
    }
}

/// Boundary wrapper translating scoring errors into HTTP responses.
///
/// A failed request always yields a structured error body, never a response
/// that could be mistaken for a prediction.
pub struct ApiError(pub ScoringError);

/// HTTP status for a scoring error surfaced at the boundary.
pub fn status_for(error: &ScoringError) -> StatusCode {
    match error {
        ScoringError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
