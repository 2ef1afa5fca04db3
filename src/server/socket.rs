use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Relay side of a client socket, reduced to text frames
#[async_trait]
pub trait RelaySocket: Send {
    async fn send_frame(&mut self, frame: String) -> Result<(), SocketError>;

    /// Next text frame from the client; `None` once the client hung up
    async fn next_frame(&mut self) -> Result<Option<String>, SocketError>;

    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Receives every text frame a relay client sends
#[async_trait]
pub trait FrameHandler: Send + Sync {
    async fn handle_frame(&self, connection_id: &str, frame: String);
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

#[async_trait]
impl RelaySocket for WebSocket {
    async fn send_frame(&mut self, frame: String) -> Result<(), SocketError> {
        self.send(Message::Text(frame))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn next_frame(&mut self) -> Result<Option<String>, SocketError> {
        while let Some(message) = self.next().await {
            match message {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(e) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// Frames moved through one relay connection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameTally {
    pub received: usize,
    pub delivered: usize,
}

/// One client of the relay
///
/// Frames other clients sent (queued by the `ConnectionManager`) are written
/// to the socket, frames read from the socket go to the [`FrameHandler`].
pub struct RelayConnection {
    pub connection_id: String,
    socket: Box<dyn RelaySocket>,
    queue: mpsc::UnboundedReceiver<String>,
    handler: Arc<dyn FrameHandler>,
}

impl RelayConnection {
    pub fn new(
        connection_id: String,
        socket: Box<dyn RelaySocket>,
        queue: mpsc::UnboundedReceiver<String>,
        handler: Arc<dyn FrameHandler>,
    ) -> Self {
        Self {
            connection_id,
            socket,
            queue,
            handler,
        }
    }

    /// Pumps frames both ways until the client hangs up or the queue closes
    pub async fn run(mut self) -> Result<FrameTally, SocketError> {
        let mut tally = FrameTally::default();

        loop {
            tokio::select! {
                queued = self.queue.recv() => {
                    let Some(frame) = queued else { break };
                    self.socket.send_frame(frame).await?;
                    tally.delivered += 1;
                }

                incoming = self.socket.next_frame() => {
                    let Some(frame) = incoming? else { break };
                    tally.received += 1;
                    self.handler.handle_frame(&self.connection_id, frame).await;
                }
            }
        }

        if let Err(e) = self.socket.close().await {
            debug!(connection_id = %self.connection_id, error = %e, "Socket close failed");
        }
        Ok(tally)
    }
}
