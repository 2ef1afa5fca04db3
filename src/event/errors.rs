use thiserror::Error;

/// Error returned by a listener; aborts the dispatch it was raised in
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by an [`EventRegistry`](super::EventRegistry)
///
/// All of these indicate a wiring mistake (a channel declared twice, a typo
/// in a channel name, a listener that failed) and are meant to be propagated
/// rather than recovered from.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid channel name: {0:?}")]
    InvalidName(String),

    #[error("Channel '{0}' is already declared")]
    DuplicateChannel(String),

    #[error("Unknown channel '{0}'")]
    UnknownChannel(String),

    #[error("Listener on channel '{channel}' failed: {source}")]
    Listener {
        channel: String,
        #[source]
        source: ListenerError,
    },
}
