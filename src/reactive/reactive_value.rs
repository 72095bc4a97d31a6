use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use log::{trace, warn};

use crate::events::EventChannel;
use crate::{BoxError, ReactiveError, ReactiveResult};

/// Hook run before a [`ReactiveCell`] write is committed.
pub type OnSet<V> = Box<dyn Fn(&V) -> Result<(), BoxError> + Send + Sync>;

/// Hook run before a [`ReactiveMap`] write is committed.
///
/// Receives the state as it was before the write, the key being written and the new value.
pub type OnMapSet<V> = Box<dyn Fn(&HashMap<String, V>, &str, &V) -> Result<(), BoxError> + Send + Sync>;

/// A single named value whose writes go through a hook.
///
/// Every [`set`](ReactiveCell::set) calls `on_set(&new_value)` exactly once and
/// only then stores the value. If the hook returns an error the write is
/// abandoned and the old value stays. Reads never call the hook.
///
/// # Example
///
/// ```rust
/// use pace_guard_core::reactive::ReactiveCell;
/// use pace_guard_core::ReactiveError;
///
/// let volume = ReactiveCell::new("volume", 5u8, |v: &u8| {
///     if *v > 10 {
///         return Err(format!("volume {} is above 10", v).into());
///     }
///     Ok(())
/// });
///
/// volume.set(7).unwrap();
/// assert_eq!(volume.get().unwrap(), 7);
///
/// assert!(matches!(volume.set(11), Err(ReactiveError::Rejected { .. })));
/// assert_eq!(volume.get().unwrap(), 7);
/// ```
pub struct ReactiveCell<V> {
    key: String,
    value: Mutex<V>,
    on_set: OnSet<V>,
}

impl<V> ReactiveCell<V> {
    /// Creates a cell tracking `key` with an initial `value`.
    pub fn new<F>(key: impl Into<String>, value: V, on_set: F) -> Self
    where
        F: Fn(&V) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        ReactiveCell {
            key: key.into(),
            value: Mutex::new(value),
            on_set: Box::new(on_set),
        }
    }

    /// Name of the tracked property.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Runs `f` against the current value.
    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> ReactiveResult<R> {
        let value = self
            .value
            .try_lock()
            .map_err(|_| ReactiveError::ContentionFailure)?;

        Ok(f(&value))
    }

    /// Writes `value`: hook first, then commit.
    ///
    /// # Returns
    /// * `Ok(())` - The hook accepted the value and it is now stored
    /// * `Err(ReactiveError::Rejected)` - The hook failed; the old value is kept
    /// * `Err(ReactiveError::ContentionFailure)` - If unable to acquire the internal lock
    pub fn set(&self, value: V) -> ReactiveResult {
        if let Err(source) = (self.on_set)(&value) {
            warn!("reactive cell `{}`: write rejected: {}", self.key, source);
            return Err(ReactiveError::Rejected {
                key: self.key.clone(),
                source,
            });
        }

        let mut slot = self
            .value
            .try_lock()
            .map_err(|_| ReactiveError::ContentionFailure)?;
        *slot = value;
        trace!("reactive cell `{}`: write committed", self.key);
        Ok(())
    }
}

impl<V: Clone> ReactiveCell<V> {
    /// Returns a copy of the current value.
    pub fn get(&self) -> ReactiveResult<V> {
        self.with(V::clone)
    }
}

impl<V: fmt::Debug> fmt::Debug for ReactiveCell<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// A string-keyed state object whose writes go through a hook.
///
/// Any key may be written, including keys absent at construction. The hook
/// sees the state before the write, the key and the new value, and can veto
/// the write by returning an error.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::{Arc, Mutex};
/// use pace_guard_core::reactive::ReactiveMap;
///
/// let changes = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&changes);
///
/// let form = ReactiveMap::new(
///     HashMap::from([("name".to_string(), String::new())]),
///     move |_before: &HashMap<String, String>, key: &str, value: &String| {
///         sink.lock().unwrap().push(format!("{}={}", key, value));
///         Ok(())
///     },
/// );
///
/// form.set("name", "Ada".to_string()).unwrap();
/// form.set("email", "ada@example.com".to_string()).unwrap();
///
/// assert_eq!(form.get("email").unwrap().as_deref(), Some("ada@example.com"));
/// assert_eq!(*changes.lock().unwrap(), vec!["name=Ada", "email=ada@example.com"]);
/// ```
pub struct ReactiveMap<V> {
    state: Mutex<HashMap<String, V>>,
    on_set: OnMapSet<V>,
}

impl<V: Clone> ReactiveMap<V> {
    /// Creates a map with `initial` state.
    pub fn new<F>(initial: HashMap<String, V>, on_set: F) -> Self
    where
        F: Fn(&HashMap<String, V>, &str, &V) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        ReactiveMap {
            state: Mutex::new(initial),
            on_set: Box::new(on_set),
        }
    }

    /// Returns a copy of the value under `key`.
    pub fn get(&self, key: &str) -> ReactiveResult<Option<V>> {
        let state = self
            .state
            .try_lock()
            .map_err(|_| ReactiveError::ContentionFailure)?;

        Ok(state.get(key).cloned())
    }

    /// Returns a copy of the whole state.
    pub fn snapshot(&self) -> ReactiveResult<HashMap<String, V>> {
        let state = self
            .state
            .try_lock()
            .map_err(|_| ReactiveError::ContentionFailure)?;

        Ok(state.clone())
    }

    /// Writes `value` under `key`: hook first, then commit.
    pub fn set(&self, key: impl Into<String>, value: V) -> ReactiveResult {
        let key = key.into();
        let before = self.snapshot()?;

        if let Err(source) = (self.on_set)(&before, &key, &value) {
            warn!("reactive map: write to `{}` rejected: {}", key, source);
            return Err(ReactiveError::Rejected { key, source });
        }

        let mut state = self
            .state
            .try_lock()
            .map_err(|_| ReactiveError::ContentionFailure)?;
        trace!("reactive map: write to `{}` committed", key);
        state.insert(key, value);
        Ok(())
    }

    /// Number of keys.
    pub fn len(&self) -> ReactiveResult<usize> {
        let state = self
            .state
            .try_lock()
            .map_err(|_| ReactiveError::ContentionFailure)?;

        Ok(state.len())
    }

    /// Returns whether the map has no keys.
    pub fn is_empty(&self) -> ReactiveResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// A single named value that announces each write on an [`EventChannel`].
///
/// Unlike [`ReactiveCell`], listeners cannot veto a write, so the value is
/// committed first and the full updated state (`{key: value}`) is dispatched
/// afterwards, synchronously and in listener-registration order.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::{Arc, Mutex};
/// use pace_guard_core::reactive::ReactiveEventCell;
/// use pace_guard_core::EventChannel;
///
/// let channel = EventChannel::<HashMap<String, bool>>::new("theme-change");
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// channel.add_listener(move |state: &HashMap<String, bool>| {
///     sink.lock().unwrap().push(state["dark"]);
/// }).unwrap();
///
/// let dark = ReactiveEventCell::new("dark", false, channel);
/// assert_eq!(dark.set(true).unwrap(), 1);
/// assert_eq!(*seen.lock().unwrap(), vec![true]);
/// ```
pub struct ReactiveEventCell<V> {
    key: String,
    value: Mutex<V>,
    channel: EventChannel<HashMap<String, V>>,
}

impl<V: Clone> ReactiveEventCell<V> {
    /// Creates a cell tracking `key` that dispatches on `channel`.
    pub fn new(key: impl Into<String>, value: V, channel: EventChannel<HashMap<String, V>>) -> Self {
        ReactiveEventCell {
            key: key.into(),
            value: Mutex::new(value),
            channel,
        }
    }

    /// Name of the tracked property.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The channel writes are announced on.
    pub fn channel(&self) -> &EventChannel<HashMap<String, V>> {
        &self.channel
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> ReactiveResult<V> {
        let value = self
            .value
            .try_lock()
            .map_err(|_| ReactiveError::ContentionFailure)?;

        Ok(value.clone())
    }

    /// Commits `value`, then dispatches the updated state.
    ///
    /// # Returns
    /// * `Ok(n)` - The value is stored and `n` listeners received the event
    /// * `Err(ReactiveError::ContentionFailure)` - The value lock was busy; nothing changed
    /// * `Err(ReactiveError::NotDispatched)` - The value is stored but the channel
    ///   was busy, so no listener heard about it
    pub fn set(&self, value: V) -> ReactiveResult<usize> {
        {
            let mut slot = self
                .value
                .try_lock()
                .map_err(|_| ReactiveError::ContentionFailure)?;
            *slot = value.clone();
        }

        let state = HashMap::from([(self.key.clone(), value)]);
        self.channel.dispatch(&state).map_err(|_| {
            warn!("reactive event cell `{}`: committed write not dispatched", self.key);
            ReactiveError::NotDispatched {
                key: self.key.clone(),
            }
        })
    }
}

/// A function wrapper that reports every call before forwarding it.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use pace_guard_core::reactive::ReactiveFn;
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
///
/// let add = ReactiveFn::new(
///     |(a, b): (i32, i32)| a + b,
///     move |_args: &(i32, i32)| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     },
/// );
///
/// assert_eq!(add.call((2, 3)), 5);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct ReactiveFn<A, R> {
    func: Box<dyn Fn(A) -> R + Send + Sync>,
    on_call: Box<dyn Fn(&A) + Send + Sync>,
}

impl<A, R> ReactiveFn<A, R> {
    /// Wraps `func`; `on_call` sees the arguments of every call first.
    pub fn new<F, H>(func: F, on_call: H) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        H: Fn(&A) + Send + Sync + 'static,
    {
        ReactiveFn {
            func: Box::new(func),
            on_call: Box::new(on_call),
        }
    }

    /// Reports `args` to the hook, then calls the wrapped function.
    pub fn call(&self, args: A) -> R {
        (self.on_call)(&args);
        (self.func)(args)
    }
}
