use axum::extract::State;
use axum::http::StatusCode;

use super::state::ApiState;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Ready once the periodic triggers are running.
pub async fn ready(State(state): State<ApiState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
