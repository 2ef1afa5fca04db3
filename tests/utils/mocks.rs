use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use chatbox::connection::{Transport, TransportError};
use chatbox::server::ConnectionManager;
use chatbox::ui::{FormField, MessageView, Renderer};

// ============================================================================
// Client Transport
// ============================================================================

/// Client end of an in-memory socket
pub struct MockTransport {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

/// Server end of an in-memory socket; dropping `to_client` hangs up
pub struct MockServer {
    pub to_client: mpsc::UnboundedSender<String>,
    pub from_client: mpsc::UnboundedReceiver<String>,
}

pub fn mock_transport() -> (MockTransport, MockServer) {
    let (to_client, inbound) = mpsc::unbounded_channel();
    let (outbound, from_client) = mpsc::unbounded_channel();
    (
        MockTransport { inbound, outbound },
        MockServer {
            to_client,
            from_client,
        },
    )
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(text)
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn receive_text(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.inbound.recv().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Transport that yields once before every write, like a socket whose send
/// does not complete in a single poll
pub struct SlowTransport {
    inner: MockTransport,
}

impl SlowTransport {
    pub fn new(inner: MockTransport) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for SlowTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        tokio::task::yield_now().await;
        self.inner.send_text(text).await
    }

    async fn receive_text(&mut self) -> Result<Option<String>, TransportError> {
        self.inner.receive_text().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close().await
    }
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Field { target_id: String, field_id: String },
    Message { target_id: String, view: MessageView },
    FormDisabled(bool),
}

/// Renderer that records every call; clones share the same record
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    calls: Rc<RefCell<Vec<Rendered>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Rendered> {
        self.calls.borrow().clone()
    }

    pub fn messages(&self) -> Vec<MessageView> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Rendered::Message { view, .. } => Some(view.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn form_states(&self) -> Vec<bool> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Rendered::FormDisabled(disabled) => Some(*disabled),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render_field(&self, target_id: &str, field: &FormField) -> io::Result<()> {
        self.calls.borrow_mut().push(Rendered::Field {
            target_id: target_id.to_string(),
            field_id: field.id().to_string(),
        });
        Ok(())
    }

    fn render_message(&self, target_id: &str, message: &MessageView) -> io::Result<()> {
        self.calls.borrow_mut().push(Rendered::Message {
            target_id: target_id.to_string(),
            view: message.clone(),
        });
        Ok(())
    }

    fn form_disabled_changed(&self, disabled: bool) -> io::Result<()> {
        self.calls.borrow_mut().push(Rendered::FormDisabled(disabled));
        Ok(())
    }
}

// ============================================================================
// Relay Connections
// ============================================================================

#[derive(Clone)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, Vec<String>>>>,
    connected: Arc<RwLock<Vec<String>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(RwLock::new(HashMap::new())),
            connected: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add_connected(&self, connection_id: &str) {
        self.connected.write().await.push(connection_id.to_string());
    }

    pub async fn get_messages_for(&self, connection_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(connection_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, connection_id: String, _sender: mpsc::UnboundedSender<String>) {
        self.add_connected(&connection_id).await;
    }

    async fn remove_connection(&self, connection_id: &str) {
        self.connected.write().await.retain(|c| c != connection_id);
    }

    async fn connection_count(&self) -> usize {
        self.connected.read().await.len()
    }

    async fn broadcast_except(&self, sender_id: &str, message: &str) -> usize {
        let targets: Vec<String> = self
            .connected
            .read()
            .await
            .iter()
            .filter(|c| c.as_str() != sender_id)
            .cloned()
            .collect();

        let mut sent_messages = self.sent_messages.write().await;
        for target in &targets {
            sent_messages
                .entry(target.clone())
                .or_default()
                .push(message.to_string());
        }
        targets.len()
    }
}
