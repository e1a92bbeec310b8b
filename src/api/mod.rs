pub mod flips;
pub mod health;
pub mod signals;

use crate::AppState;
use axum::Router;
use serde::Serialize;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Number of items in `data` (1 for single objects).
    pub count: usize,
    /// Response timestamp in milliseconds.
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    fn new(data: T, count: usize) -> Self {
        Self {
            data,
            meta: ApiMeta {
                count,
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        }
    }

    fn single(data: T) -> Self {
        Self::new(data, 1)
    }
}

impl<T> ApiResponse<Vec<T>> {
    fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self::new(data, count)
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/signals", signals::router())
        .nest("/api/flips", flips::router())
}
