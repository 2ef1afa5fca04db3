// Static page hosting and the WebSocket chat relay

use axum::{routing::get, Router};
use std::path::Path;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::shared::AppState;

// Public API - what other modules can use
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, RelayMessageHandler};
pub use socket::{FrameHandler, FrameTally, RelayConnection, RelaySocket, SocketError};

// Internal modules
mod connection_manager;
mod handler;
mod socket;

/// Relay at `/ws`, everything else served from `static_dir` with `index.html` as fallback
pub fn create_router(app_state: AppState, static_dir: &Path) -> Router {
    let index_file = static_dir.join("index.html");
    let static_service = ServeDir::new(static_dir).fallback(ServeFile::new(index_file));

    Router::new()
        .route("/ws", get(websocket_handler))
        .fallback_service(static_service)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
