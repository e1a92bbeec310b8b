use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Assets on the watch list.
    assets: usize,
    /// Start of the last completed cycle (ms), if any ran yet.
    last_cycle_at: Option<i64>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let last_cycle = state.signal_store.last_cycle();

    // Every evaluated asset unreachable means the provider is down.
    let degraded = last_cycle
        .as_ref()
        .map(|r| !r.evaluated.is_empty() && r.unreachable.len() == r.evaluated.len())
        .unwrap_or(false);

    Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        assets: state.config.assets.len(),
        last_cycle_at: last_cycle.map(|r| r.started_at),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
