use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::connection::ConnectionError;
use crate::event::EventError;
use crate::server::ConnectionManager;
use crate::ui::UiError;

/// Shared state of the relay server
#[derive(Clone)]
pub struct AppState {
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub max_connections: usize,
    /// One permit per relay connection, held until the connection ends
    pub connection_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>, max_connections: usize) -> Self {
        Self {
            connection_manager,
            max_connections,
            connection_slots: Arc::new(Semaphore::new(max_connections)),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error("UI error: {0}")]
    Ui(#[from] UiError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Io(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("I/O error: {}", e),
            ),
            AppError::Event(_) | AppError::Ui(_) | AppError::Connection(_) | AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
