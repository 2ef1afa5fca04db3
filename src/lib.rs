// Library crate for the chatbox chat client and relay
// This file exposes the public API for the binary and integration tests

pub mod app;
pub mod config;
pub mod connection;
pub mod event;
pub mod server;
pub mod shared;
pub mod ui;

// Re-export commonly used types for easier access in tests
pub use app::ChatApp;
pub use connection::{ChatFrame, ChatMessage, ConnectionController, ConnectionEvent, Transport};
pub use event::{EventError, EventRegistry, Listener};
pub use server::{create_router, InMemoryConnectionManager};
pub use shared::{AppError, AppState};
pub use ui::{UiController, UiEvent};
