use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// HTTP-facing error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// A market data fetch failed for one (asset, timeframe) or quote.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP {status} from market data provider")]
    Status { status: u16 },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Fetch timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

/// Snapshot store read or write failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("Corrupt snapshot for {asset_id}: {detail}")]
    Corrupt { asset_id: String, detail: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration rejected at startup.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    ZeroPeriod { name: &'static str },

    #[error("fast period {fast} must be shorter than slow period {slow}")]
    PeriodOrder { fast: usize, slow: usize },

    #[error("threshold {0} is outside 0..=100")]
    ThresholdRange(f64),

    #[error("lower threshold {lower} is above upper threshold {upper}")]
    ThresholdOrder { lower: f64, upper: f64 },

    #[error("no {0} configured")]
    Empty(&'static str),

    #[error("invalid timeframe entry: {0}")]
    Timeframe(String),

    #[error("unknown snapshot store backend: {0}")]
    Backend(String),

    #[error("{name} must be at least one second")]
    ZeroInterval { name: &'static str },
}

/// Cycle-level failure surfaced to the caller.
#[derive(Error, Debug, PartialEq)]
pub enum CycleError {
    #[error("market data provider unreachable for all {0} assets")]
    ProviderUnreachable(usize),
}
