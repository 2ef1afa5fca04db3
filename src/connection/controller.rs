use std::cell::RefCell;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    errors::ConnectionError,
    messages::{ChatFrame, ChatMessage},
    transport::{self, Transport},
};
use crate::event::{EventError, EventRegistry, Listener, ListenerError};

/// Events emitted by the [`ConnectionController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum ConnectionEvent {
    /// The socket connection is established
    Connected,
    /// The socket connection is gone
    Disconnected,
    /// A chat frame arrived; payload is the decoded [`ChatMessage`]
    MessageReceived,
}

/// Maps the lifecycle of a chat socket onto an [`EventRegistry`]
///
/// Outbound frames queued by [`send_message`](Self::send_message) are written
/// by [`run`](Self::run), which owns the transport for the whole session.
pub struct ConnectionController {
    url: String,
    events: EventRegistry<ChatMessage>,
    outbound: RefCell<Option<mpsc::UnboundedSender<String>>>,
}

impl ConnectionController {
    pub fn new(url: impl Into<String>) -> Result<Self, ConnectionError> {
        let events = EventRegistry::new(
            "ConnectionController",
            ConnectionEvent::iter().map(|event| event.to_string()),
        )?;

        Ok(Self {
            url: url.into(),
            events,
            outbound: RefCell::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn events(&self) -> &EventRegistry<ChatMessage> {
        &self.events
    }

    pub fn is_connected(&self) -> bool {
        self.outbound.borrow().is_some()
    }

    pub fn on_connected<F>(&self, callback: F) -> Result<Listener<ChatMessage>, EventError>
    where
        F: Fn() -> Result<(), ListenerError> + 'static,
    {
        self.events
            .on(ConnectionEvent::Connected.as_ref(), move |_| callback())
    }

    pub fn on_disconnected<F>(&self, callback: F) -> Result<Listener<ChatMessage>, EventError>
    where
        F: Fn() -> Result<(), ListenerError> + 'static,
    {
        self.events
            .on(ConnectionEvent::Disconnected.as_ref(), move |_| callback())
    }

    pub fn on_message_received<F>(&self, callback: F) -> Result<Listener<ChatMessage>, EventError>
    where
        F: Fn(&ChatMessage) -> Result<(), ListenerError> + 'static,
    {
        self.events
            .on(
                ConnectionEvent::MessageReceived.as_ref(),
                move |payload| match payload {
                    Some(message) => callback(message),
                    None => {
                        warn!("messageReceived emitted without a message");
                        Ok(())
                    }
                },
            )
    }

    pub fn off(
        &self,
        event: ConnectionEvent,
        listener: &Listener<ChatMessage>,
    ) -> Result<bool, EventError> {
        self.events.unsubscribe(event.as_ref(), listener)
    }

    /// Connects to the configured URL and runs the session until it closes
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        info!(url = %self.url, "Connecting");
        let socket = transport::connect(&self.url).await?;
        self.run(socket).await
    }

    /// Runs a session over an already opened transport
    ///
    /// Emits `connected` first and `disconnected` once the transport closes or
    /// fails. Both ends of the session are handled here: queued outbound
    /// frames are written, inbound frames become `messageReceived` events.
    pub async fn run<T: Transport>(&self, mut transport: T) -> Result<(), ConnectionError> {
        let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel::<String>();
        *self.outbound.borrow_mut() = Some(outbound_sender);
        // Clears the queue even when this future is dropped mid-session
        let outbound_guard = OutboundGuard(&self.outbound);

        info!(url = %self.url, "Connection established");
        let session = self.session(&mut transport, &mut outbound_receiver).await;

        drop(outbound_guard);
        if let Err(e) = transport.close().await {
            debug!(url = %self.url, error = %e, "Transport close failed");
        }

        match &session {
            Ok(()) => info!(url = %self.url, "Connection closed"),
            Err(e) => warn!(url = %self.url, error = %e, "Connection lost"),
        }

        let disconnected = self
            .events
            .emit(ConnectionEvent::Disconnected.as_ref(), None);
        session?;
        disconnected?;
        Ok(())
    }

    /// Ends the running session once the frames already queued are written
    ///
    /// `run` then closes the transport and emits `disconnected`. Returns
    /// `false` when no session was running.
    pub fn disconnect(&self) -> bool {
        // Dropping the only sender closes the queue once it is drained
        if self.outbound.borrow_mut().take().is_none() {
            return false;
        }

        info!(url = %self.url, "Disconnect requested");
        true
    }

    /// Queues `{user, message}` for the running session
    pub fn send_message(&self, user: &str, message: &str) -> Result<(), ConnectionError> {
        let outbound = self.outbound.borrow();
        let sender = outbound.as_ref().ok_or(ConnectionError::NotConnected)?;

        let frame = ChatFrame::new(user, message).to_json()?;
        sender
            .send(frame)
            .map_err(|_| ConnectionError::NotConnected)?;

        debug!(user = %user, "Chat message queued");
        Ok(())
    }

    async fn session<T: Transport>(
        &self,
        transport: &mut T,
        outbound_receiver: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<(), ConnectionError> {
        self.events.emit(ConnectionEvent::Connected.as_ref(), None)?;

        loop {
            tokio::select! {
                // Frames queued by send_message
                frame = outbound_receiver.recv() => {
                    match frame {
                        Some(frame) => transport.send_text(frame).await?,
                        None => break,
                    }
                }

                // Frames from the server
                frame = transport.receive_text() => {
                    match frame? {
                        Some(frame) => self.handle_frame(&frame)?,
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_frame(&self, text: &str) -> Result<(), ConnectionError> {
        match ChatFrame::from_json(text) {
            Ok(frame) => {
                let message = ChatMessage::from(frame);
                self.events
                    .emit(ConnectionEvent::MessageReceived.as_ref(), Some(&message))?;
            }
            Err(e) => {
                warn!(frame = %text, error = %e, "Dropping malformed chat frame");
            }
        }
        Ok(())
    }
}

struct OutboundGuard<'a>(&'a RefCell<Option<mpsc::UnboundedSender<String>>>);

impl Drop for OutboundGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_connection_channels() {
        let controller = ConnectionController::new("ws://localhost:3000/ws").unwrap();

        assert_eq!(
            controller.events().channels(),
            vec!["connected", "disconnected", "messageReceived"]
        );
        assert!(!controller.is_connected());
    }

    #[test]
    fn test_send_message_requires_session() {
        let controller = ConnectionController::new("ws://localhost:3000/ws").unwrap();

        let result = controller.send_message("alice", "hello");

        assert!(matches!(result, Err(ConnectionError::NotConnected)));
    }

    #[test]
    fn test_disconnect_without_session() {
        let controller = ConnectionController::new("ws://localhost:3000/ws").unwrap();

        assert!(!controller.disconnect());
    }

    #[test]
    fn test_malformed_frame_is_dropped() {
        let controller = ConnectionController::new("ws://localhost:3000/ws").unwrap();
        let received = std::rc::Rc::new(std::cell::Cell::new(0));
        {
            let received = received.clone();
            controller
                .on_message_received(move |_| {
                    received.set(received.get() + 1);
                    Ok(())
                })
                .unwrap();
        }

        controller.handle_frame("{\"user\":\"bob\"}").unwrap();
        controller
            .handle_frame("{\"user\":\"bob\",\"message\":\"hi\"}")
            .unwrap();

        assert_eq!(received.get(), 1);
    }
}
