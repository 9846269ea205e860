use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::state::ApiState;

#[derive(Debug, Deserialize)]
pub struct InstrumentSample {
    pub value: f64,
}

/// Accepts one counter or gauge value from the application tier.
pub async fn instrument(
    State(state): State<ApiState>,
    Path(metric): Path<String>,
    Json(sample): Json<InstrumentSample>,
) -> StatusCode {
    let Some(instruments) = state.instruments() else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    if !sample.value.is_finite() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    if instruments.ingest(&metric, sample.value).await {
        tracing::debug!(metric = %metric, value = sample.value, "instrument sample ingested");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
