//! Pending flip notifications.
//!
//! - GET    /api/flips         - Pending notifications, newest first
//! - DELETE /api/flips/:asset  - Dismiss an asset's pending notification

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::types::FlipNotification;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_flips))
        .route("/:asset", delete(dismiss_flip))
}

async fn list_flips(State(state): State<AppState>) -> Json<ApiResponse<Vec<FlipNotification>>> {
    Json(ApiResponse::list(state.broadcaster.pending()))
}

async fn dismiss_flip(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> Result<Json<ApiResponse<FlipNotification>>> {
    let dismissed = state
        .broadcaster
        .dismiss(&asset)
        .ok_or_else(|| AppError::NotFound(format!("No pending flip for {}", asset)))?;

    Ok(Json(ApiResponse::single(dismissed)))
}
