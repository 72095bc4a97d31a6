//! Named custom-event dispatch.
//!
//! [`EventChannel`] stands in for the host's custom event facility: listeners
//! register under a channel, and [`dispatch`](EventChannel::dispatch) delivers a
//! payload to each of them synchronously, in registration order.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, trace};

use crate::{GuardError, GuardResult};

/// Event listener callback type
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`EventChannel::add_listener`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A named event channel.
///
/// Cloning a channel yields another handle to the same listener list.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use pace_guard_core::EventChannel;
///
/// let channel = EventChannel::<u32>::new("counter-changed");
/// let total = Arc::new(AtomicUsize::new(0));
/// let sink = Arc::clone(&total);
///
/// channel.add_listener(move |n| {
///     sink.fetch_add(*n as usize, Ordering::SeqCst);
/// }).unwrap();
///
/// assert_eq!(channel.dispatch(&5), Ok(1));
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
pub struct EventChannel<T> {
    name: Arc<str>,
    state: Arc<Mutex<EventChannelState<T>>>,
}

struct EventChannelState<T> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T> EventChannel<T> {
    /// Creates an empty channel called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        EventChannel {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(EventChannelState {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Name of the event carried by this channel.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a listener. Listeners run in registration order.
    pub fn add_listener<F>(&self, listener: F) -> GuardResult<ListenerId>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, Arc::new(listener)));
        debug!("event `{}`: listener {} added", self.name, id.0);
        Ok(id)
    }

    /// Removes a listener. Removing an unknown id is a no-op returning `false`.
    pub fn remove_listener(&self, id: ListenerId) -> GuardResult<bool> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        Ok(state.listeners.len() != before)
    }

    /// Delivers `payload` to every listener registered when the call starts.
    ///
    /// Listeners added or removed during dispatch take effect on the next one.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of listeners that received the payload
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    pub fn dispatch(&self, payload: &T) -> GuardResult<usize> {
        let snapshot: Vec<Listener<T>> = {
            let state = self
                .state
                .try_lock()
                .map_err(|_| GuardError::ContentionFailure)?;
            state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        trace!("event `{}`: dispatching to {} listener(s)", self.name, snapshot.len());
        for listener in &snapshot {
            listener(payload);
        }
        Ok(snapshot.len())
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> GuardResult<usize> {
        let state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(state.listeners.len())
    }
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        EventChannel {
            name: Arc::clone(&self.name),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
