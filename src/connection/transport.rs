use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::errors::TransportError;

/// Text-frame socket - all the connection controller needs is send/receive
#[async_trait]
pub trait Transport: Send {
    /// Send a text frame to the server
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Receive the next text frame (None once the connection is closed)
    async fn receive_text(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Client WebSocket stream as returned by [`connect`]
pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens a WebSocket connection to `url`
pub async fn connect(url: &str) -> Result<ClientSocket, TransportError> {
    let (socket, response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

    debug!(url = %url, status = %response.status(), "WebSocket handshake completed");
    Ok(socket)
}

#[async_trait]
impl<S> Transport for WebSocketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.send(Message::Text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn receive_text(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Pings are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        WebSocketStream::close(self, None)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}
