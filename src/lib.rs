//! cryptoflip - multi-timeframe trend classification with confirmed flip alerts

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;
pub mod websocket;

use axum::{routing::get, Router};
use config::Config;
use services::{FlipBroadcaster, SignalStore};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use websocket::RoomManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub signal_store: Arc<SignalStore>,
    pub broadcaster: Arc<FlipBroadcaster>,
    pub room_manager: Arc<RoomManager>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let room_manager = RoomManager::new();
        Self {
            config,
            signal_store: SignalStore::new(),
            broadcaster: FlipBroadcaster::new(room_manager.clone()),
            room_manager,
        }
    }
}

/// Build the HTTP + WebSocket router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .route("/ws", get(websocket::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Re-export commonly used types
pub use types::*;
