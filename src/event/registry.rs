use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

use super::errors::{EventError, ListenerError};

type Callback<P> = dyn Fn(Option<&P>) -> Result<(), ListenerError>;

/// Handle to a subscribed callback
///
/// Clones share the same callback, and equality is identity: a handle only
/// matches clones of itself, never another handle wrapping an identical
/// closure. Keep the handle returned by `subscribe`/`on` to be able to
/// unsubscribe later.
pub struct Listener<P> {
    callback: Rc<Callback<P>>,
}

impl<P> Listener<P> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Option<&P>) -> Result<(), ListenerError> + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Whether both handles refer to the same subscribed callback
    pub fn same_as(&self, other: &Listener<P>) -> bool {
        Rc::as_ptr(&self.callback) as *const () == Rc::as_ptr(&other.callback) as *const ()
    }

    fn call(&self, payload: Option<&P>) -> Result<(), ListenerError> {
        (self.callback)(payload)
    }
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<P> PartialEq for Listener<P> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<P> Eq for Listener<P> {}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &(Rc::as_ptr(&self.callback) as *const ()))
            .finish()
    }
}

struct Channel<P> {
    name: String,
    listeners: Vec<Listener<P>>,
}

/// Synchronous publish/subscribe hub with a closed set of named channels
///
/// Every channel of a registry carries the same payload type `P`; listeners
/// receive `Some(&payload)` or `None` when the event was emitted without one.
/// Channels are kept in declaration order and are never removed.
///
/// The registry is single-threaded: listeners are reference counted with `Rc`
/// and the channel table lives in a `RefCell`, so it cannot be shared across
/// threads. Emission snapshots the listener list first, which lets a listener
/// emit, subscribe or unsubscribe on the same registry while being dispatched.
pub struct EventRegistry<P> {
    owner: String,
    channels: RefCell<Vec<Channel<P>>>,
}

impl<P> EventRegistry<P> {
    /// Creates a registry owned by `owner` with the given channels declared in order
    pub fn new<I>(owner: impl Into<String>, names: I) -> Result<Self, EventError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let registry = Self {
            owner: owner.into(),
            channels: RefCell::new(Vec::new()),
        };

        for name in names {
            registry.declare(name)?;
        }

        Ok(registry)
    }

    /// Declares a new channel with an empty listener list
    pub fn declare(&self, name: impl Into<String>) -> Result<(), EventError> {
        let name = name.into();

        if !is_valid_name(&name) {
            return Err(EventError::InvalidName(name));
        }

        let mut channels = self.channels.borrow_mut();
        if channels.iter().any(|channel| channel.name == name) {
            return Err(EventError::DuplicateChannel(name));
        }

        debug!(owner = %self.owner, channel = %name, "Channel declared");
        channels.push(Channel {
            name,
            listeners: Vec::new(),
        });
        Ok(())
    }

    /// Names of the declared channels, in declaration order
    pub fn channels(&self) -> Vec<String> {
        self.channels
            .borrow()
            .iter()
            .map(|channel| channel.name.clone())
            .collect()
    }

    /// Number of listeners currently attached to `name`
    pub fn listener_count(&self, name: &str) -> Result<usize, EventError> {
        let channels = self.channels.borrow();
        let channel = find_channel(&channels, name)?;
        Ok(channel.listeners.len())
    }

    /// Appends `listener` to the channel's listener list
    pub fn subscribe(&self, name: &str, listener: Listener<P>) -> Result<(), EventError> {
        let mut channels = self.channels.borrow_mut();
        let channel = find_channel_mut(&mut channels, name)?;
        channel.listeners.push(listener);

        debug!(
            owner = %self.owner,
            channel = %name,
            listeners = channel.listeners.len(),
            "Listener subscribed"
        );
        Ok(())
    }

    /// Wraps `callback` in a [`Listener`], subscribes it and returns the handle
    pub fn on<F>(&self, name: &str, callback: F) -> Result<Listener<P>, EventError>
    where
        F: Fn(Option<&P>) -> Result<(), ListenerError> + 'static,
    {
        let listener = Listener::new(callback);
        self.subscribe(name, listener.clone())?;
        Ok(listener)
    }

    /// Detaches every occurrence of `listener` from the channel
    ///
    /// Returns `Ok(false)` and logs a warning when the listener was not attached.
    pub fn unsubscribe(&self, name: &str, listener: &Listener<P>) -> Result<bool, EventError> {
        let mut channels = self.channels.borrow_mut();
        let channel = find_channel_mut(&mut channels, name)?;

        let before = channel.listeners.len();
        channel.listeners.retain(|attached| !attached.same_as(listener));
        let removed = before - channel.listeners.len();

        if removed == 0 {
            warn!(
                owner = %self.owner,
                channel = %name,
                "Trying to remove unassigned listener"
            );
            return Ok(false);
        }

        debug!(
            owner = %self.owner,
            channel = %name,
            removed = removed,
            "Listener unsubscribed"
        );
        Ok(true)
    }

    /// Invokes every listener attached to `name`, in subscription order
    ///
    /// Returns the number of listeners invoked. The first failing listener
    /// stops the dispatch and its error is returned as
    /// [`EventError::Listener`]. Emitting on a channel nobody listens to is
    /// allowed but logged as a warning.
    pub fn emit(&self, name: &str, payload: Option<&P>) -> Result<usize, EventError> {
        let listeners = {
            let channels = self.channels.borrow();
            find_channel(&channels, name)?.listeners.clone()
        };

        if listeners.is_empty() {
            warn!(
                owner = %self.owner,
                channel = %name,
                "Event triggered without any listener"
            );
            return Ok(0);
        }

        debug!(
            owner = %self.owner,
            channel = %name,
            listeners = listeners.len(),
            "Dispatching event"
        );

        for listener in &listeners {
            listener
                .call(payload)
                .map_err(|source| EventError::Listener {
                    channel: name.to_string(),
                    source,
                })?;
        }

        Ok(listeners.len())
    }
}

impl<P> fmt::Debug for EventRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.channels.borrow();
        f.debug_struct("EventRegistry")
            .field("owner", &self.owner)
            .field(
                "channels",
                &channels
                    .iter()
                    .map(|channel| (channel.name.as_str(), channel.listeners.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Channel names are identifiers: ASCII letters, digits, `_`, `-` and `.`,
/// not starting with a digit
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn find_channel<'a, P>(
    channels: &'a [Channel<P>],
    name: &str,
) -> Result<&'a Channel<P>, EventError> {
    channels
        .iter()
        .find(|channel| channel.name == name)
        .ok_or_else(|| EventError::UnknownChannel(name.to_string()))
}

fn find_channel_mut<'a, P>(
    channels: &'a mut [Channel<P>],
    name: &str,
) -> Result<&'a mut Channel<P>, EventError> {
    channels
        .iter_mut()
        .find(|channel| channel.name == name)
        .ok_or_else(|| EventError::UnknownChannel(name.to_string()))
}
