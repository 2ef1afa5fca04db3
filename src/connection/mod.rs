// Public API - what other modules can use
pub use controller::{ConnectionController, ConnectionEvent};
pub use errors::{ConnectionError, TransportError};
pub use messages::{ChatFrame, ChatMessage};
pub use transport::{connect, ClientSocket, Transport};

// Internal modules
mod controller;
mod errors;
mod messages;
mod transport;
