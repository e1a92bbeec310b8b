//! Signal API endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::services::{ConfidenceFilter, SignalFilter};
use crate::types::{AssetEvaluation, Direction, SignalSummary};
use crate::AppState;

/// Query parameters for the signal list.
#[derive(Debug, Default, Deserialize)]
pub struct SignalsQuery {
    /// bullish, bearish or neutral. Omitted or "all" means no filter.
    pub signal: Option<String>,
    /// Configured timeframe key the direction filter applies to.
    pub timeframe: Option<String>,
    /// Confidence key (e.g. confirmed-bullish) or "weak".
    pub confidence: Option<String>,
    /// Substring of the asset id or name.
    pub search: Option<String>,
}

impl SignalsQuery {
    fn into_filter(self, state: &AppState) -> Result<SignalFilter> {
        let signal = match self.signal.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(s) => Some(
                Direction::from_str(s)
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown signal: {}", s)))?,
            ),
        };

        let timeframe = match self.timeframe.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(key) => {
                if !state.config.timeframes.iter().any(|tf| tf.key == key) {
                    return Err(AppError::BadRequest(format!("Unknown timeframe: {}", key)));
                }
                Some(key.to_string())
            }
        };

        let confidence = match self.confidence.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(c) => Some(
                ConfidenceFilter::from_str(c)
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown confidence: {}", c)))?,
            ),
        };

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(SignalFilter {
            signal,
            timeframe,
            confidence,
            search,
        })
    }
}

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_signals))
        .route("/summary", get(get_summary))
        .route("/:asset", get(get_signal))
}

/// Latest evaluations, strongest first.
async fn list_signals(
    State(state): State<AppState>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<ApiResponse<Vec<AssetEvaluation>>>> {
    let filter = query.into_filter(&state)?;
    Ok(Json(ApiResponse::list(state.signal_store.all(&filter))))
}

async fn get_summary(State(state): State<AppState>) -> Json<ApiResponse<SignalSummary>> {
    Json(ApiResponse::single(state.signal_store.summary()))
}

async fn get_signal(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> Result<Json<ApiResponse<AssetEvaluation>>> {
    let evaluation = state
        .signal_store
        .get(&asset)
        .ok_or_else(|| AppError::NotFound(format!("No signal available for {}", asset)))?;

    Ok(Json(ApiResponse::single(evaluation)))
}
