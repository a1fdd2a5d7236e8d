//! HTTP delivery layer.
//!
//! Thin plumbing over the application services: routing, request
//! schemas, boundary validation and error mapping. No scoring or
//! training logic lives here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::adapters::FsArtifactStore;
use crate::application::{LabeledRow, ModelManager, TrainReport};
use crate::domain::{Driver, FeatureInput, RiskBand};
use crate::RiskError;

/// Batch scoring upper bound.
const MAX_BATCH_ITEMS: usize = 500;

/// Training row bounds.
const MIN_TRAIN_ROWS: usize = 5;
const MAX_TRAIN_ROWS: usize = 50_000;

/// Shared handler state.
pub type AppState = Arc<ModelManager<FsArtifactStore>>;

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/score", post(score))
        .route("/score/batch", post(score_batch))
        .route("/train", post(train))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    model_loaded: bool,
    model_version: String,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    risk: f64,
    band: RiskBand,
    drivers: Vec<Driver>,
    model_version: String,
    as_of_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchScoreRequest {
    items: Vec<FeatureInput>,
}

#[derive(Debug, Serialize)]
struct BatchScoreResponse {
    items: Vec<ScoreResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrainRowBody {
    features: FeatureInput,
    label: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrainRequest {
    rows: Vec<TrainRowBody>,
}

/// Error payload shape: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<RiskError> for ApiError {
    fn from(error: RiskError) -> Self {
        match error {
            RiskError::Validation(message) => Self::bad_request(message),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

async fn health(State(manager): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        model_loaded: manager.model_loaded(),
        model_version: manager.model_version(),
    })
}

fn score_item(
    manager: &ModelManager<FsArtifactStore>,
    input: &FeatureInput,
) -> Result<ScoreResponse, ApiError> {
    input.validate().map_err(ApiError::bad_request)?;
    let result = manager.score_one(&input.resolve());
    Ok(ScoreResponse {
        risk: result.risk,
        band: result.band,
        drivers: result.drivers,
        model_version: result.model_version,
        as_of_date: input.as_of_date.clone(),
    })
}

async fn score(
    State(manager): State<AppState>,
    Json(payload): Json<FeatureInput>,
) -> Result<Json<ScoreResponse>, ApiError> {
    tracing::info!(
        user_id = payload.user_id.as_deref().unwrap_or("-"),
        as_of_date = %payload.as_of_date,
        "score request"
    );
    score_item(&manager, &payload).map(Json)
}

async fn score_batch(
    State(manager): State<AppState>,
    Json(payload): Json<BatchScoreRequest>,
) -> Result<Json<BatchScoreResponse>, ApiError> {
    if payload.items.is_empty() || payload.items.len() > MAX_BATCH_ITEMS {
        return Err(ApiError::bad_request(format!(
            "batch must contain between 1 and {MAX_BATCH_ITEMS} items"
        )));
    }

    let mut items = Vec::with_capacity(payload.items.len());
    for input in &payload.items {
        items.push(score_item(&manager, input)?);
    }
    Ok(Json(BatchScoreResponse { items }))
}

async fn train(
    State(manager): State<AppState>,
    Json(payload): Json<TrainRequest>,
) -> Result<Json<TrainReport>, ApiError> {
    if payload.rows.len() < MIN_TRAIN_ROWS || payload.rows.len() > MAX_TRAIN_ROWS {
        return Err(ApiError::bad_request(format!(
            "training requires between {MIN_TRAIN_ROWS} and {MAX_TRAIN_ROWS} rows"
        )));
    }

    let mut rows = Vec::with_capacity(payload.rows.len());
    for row in &payload.rows {
        row.features.validate().map_err(ApiError::bad_request)?;
        rows.push(LabeledRow {
            features: row.features.resolve(),
            label: row.label,
        });
    }

    tracing::info!(n_rows = rows.len(), "train request");

    // Model fitting is CPU-bound; keep it off the async workers.
    let report = tokio::task::spawn_blocking(move || manager.train_and_save(&rows))
        .await
        .map_err(|join_error| ApiError::internal(format!("training task failed: {join_error}")))??;

    Ok(Json(report))
}
