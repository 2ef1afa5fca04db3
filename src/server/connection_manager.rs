use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Outbound queues of the relay's live connections, keyed by connection id
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, connection_id: &str);

    async fn connection_count(&self) -> usize;

    /// Sends `message` to every connection except `sender_id`; returns how many were reached
    async fn broadcast_except(&self, sender_id: &str, message: &str) -> usize;
}

pub struct InMemoryConnectionManager {
    // connection id -> sender
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, sender);
    }

    async fn remove_connection(&self, connection_id: &str) {
        let mut connections = self.connections.write().await;
        connections.remove(connection_id);
    }

    async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    async fn broadcast_except(&self, sender_id: &str, message: &str) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for (connection_id, sender) in connections.iter() {
            if connection_id == sender_id {
                continue;
            }
            if sender.send(message.to_string()).is_ok() {
                delivered += 1;
            } else {
                debug!(connection_id = %connection_id, "Connection queue closed");
            }
        }
        delivered
    }
}
