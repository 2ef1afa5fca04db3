// Named-channel publish/subscribe
//
// Owners (the UI and connection controllers) hold an EventRegistry with a
// fixed set of channels and expose typed subscribe methods on top of it.

// Public API - what other modules can use
pub use errors::{EventError, ListenerError};
pub use registry::{is_valid_name, EventRegistry, Listener};

// Internal modules
mod errors;
mod registry;
