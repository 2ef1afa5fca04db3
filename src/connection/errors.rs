use thiserror::Error;

use crate::event::EventError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Not connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Frame encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Event(#[from] EventError),
}
