use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use super::health;
use super::instrument;
use super::metrics;
use super::state::ApiState;
use super::status;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/metrics", get(metrics::metrics))
        .route("/status", get(status::status))
        .route("/instrument/{metric}", post(instrument::instrument))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: ApiState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
