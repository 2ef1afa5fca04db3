use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    connection_manager::ConnectionManager,
    socket::{FrameHandler, RelayConnection},
};
use crate::connection::ChatFrame;
use crate::shared::{AppError, AppState};

/// Relays every valid chat frame to all other connections
pub struct RelayMessageHandler {
    connection_manager: Arc<dyn ConnectionManager>,
}

impl RelayMessageHandler {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self { connection_manager }
    }
}

#[async_trait]
impl FrameHandler for RelayMessageHandler {
    async fn handle_frame(&self, connection_id: &str, text: String) {
        let frame = match ChatFrame::from_json(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse chat frame"
                );
                return;
            }
        };

        // Re-encode so only the two known fields go out
        let outgoing = match frame.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Failed to encode chat frame");
                return;
            }
        };

        let delivered = self
            .connection_manager
            .broadcast_except(connection_id, &outgoing)
            .await;

        debug!(
            connection_id = %connection_id,
            user = %frame.user,
            receivers = delivered,
            "Chat frame relayed"
        );
    }
}

/// WebSocket endpoint of the relay
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    // Held from before the upgrade until the connection is removed
    let Ok(slot) = app_state.connection_slots.clone().try_acquire_owned() else {
        warn!(max = app_state.max_connections, "Rejecting relay connection");
        return Err(AppError::Unavailable("Relay is full".to_string()));
    };

    Ok(ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state, slot)))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    app_state: AppState,
    slot: OwnedSemaphorePermit,
) {
    let connection_id = Uuid::new_v4().to_string();
    info!(connection_id = %connection_id, "Relay connection established");

    let (queue_sender, queue) = mpsc::unbounded_channel::<String>();
    app_state
        .connection_manager
        .add_connection(connection_id.clone(), queue_sender)
        .await;

    let handler = Arc::new(RelayMessageHandler::new(
        app_state.connection_manager.clone(),
    ));

    let connection =
        RelayConnection::new(connection_id.clone(), Box::new(socket), queue, handler);

    match connection.run().await {
        Ok(tally) => {
            info!(
                connection_id = %connection_id,
                received = tally.received,
                delivered = tally.delivered,
                "Relay connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(connection_id = %connection_id, error = %e, "Relay connection error");
        }
    }

    app_state
        .connection_manager
        .remove_connection(&connection_id)
        .await;
    drop(slot);
}
