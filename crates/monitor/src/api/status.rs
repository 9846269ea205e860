use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use vigil_common::HealthStatus;

use super::state::ApiState;

/// Live worst-of status. 503 while no monitor is attached or when any
/// dependency is down.
pub async fn status(State(state): State<ApiState>) -> Response {
    let Some(monitor) = state.monitor() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    let status = monitor.system_status().await;
    let code = if status.overall == HealthStatus::Down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(status)).into_response()
}
