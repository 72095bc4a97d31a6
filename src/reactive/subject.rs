use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use log::{debug, info, trace};

use crate::reactive::same_allocation;
use crate::{GuardError, GuardResult};

/// Receiver side of a [`Subject`].
///
/// Any `Fn(&T) + Send + Sync` closure is an observer.
pub trait Observer<T>: Send + Sync {
    /// Called once per [`Subject::notify`].
    fn update(&self, data: &T);
}

impl<T, F> Observer<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    #[inline(always)]
    fn update(&self, data: &T) {
        self(data)
    }
}

/// Observer that logs every update at `info` level.
///
/// Handy as a debugging tap on a subject.
pub struct ConcreteObserver<T> {
    label: String,
    _marker: PhantomData<fn(&T)>,
}

impl<T> ConcreteObserver<T> {
    /// Creates a logging observer whose lines are prefixed with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        ConcreteObserver {
            label: label.into(),
            _marker: PhantomData,
        }
    }
}

impl<T: Debug> Observer<T> for ConcreteObserver<T> {
    fn update(&self, data: &T) {
        info!("{}: {:?}", self.label, data);
    }
}

/// Ordered one-to-many notification registry.
///
/// Observers are kept in registration order and the same observer may be
/// registered more than once, in which case it is notified once per entry.
///
/// # Notification semantics
///
/// [`notify`](Subject::notify) takes a snapshot of the observer list before
/// calling anyone. Observers added or removed while a notification is running,
/// including an observer removing itself, only affect the next `notify`.
/// Fan-out is synchronous: a slow observer delays every observer after it.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use pace_guard_core::reactive::{Observer, Subject};
///
/// let subject = Subject::<String>::new();
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&log);
/// let observer: Arc<dyn Observer<String>> = Arc::new(move |msg: &String| {
///     sink.lock().unwrap().push(msg.clone());
/// });
///
/// subject.add_observer(observer.clone()).unwrap();
/// assert_eq!(subject.notify(&"saved".to_string()), Ok(1));
///
/// assert_eq!(subject.remove_observer(&observer), Ok(true));
/// assert_eq!(subject.remove_observer(&observer), Ok(false));
/// assert_eq!(*log.lock().unwrap(), vec!["saved".to_string()]);
/// ```
pub struct Subject<T> {
    observers: Mutex<Vec<Arc<dyn Observer<T>>>>,
}

impl<T> Subject<T> {
    /// Creates a subject with no observers.
    pub fn new() -> Self {
        Subject {
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Appends `observer` to the registry.
    pub fn add_observer(&self, observer: Arc<dyn Observer<T>>) -> GuardResult {
        let mut observers = self
            .observers
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        observers.push(observer);
        debug!("subject: observer added ({} registered)", observers.len());
        Ok(())
    }

    /// Removes the first registration of `observer`.
    ///
    /// Observers are matched by allocation, so pass a clone of the `Arc` that
    /// was registered.
    ///
    /// # Returns
    /// * `Ok(true)` - One registration was removed
    /// * `Ok(false)` - The observer was not registered; nothing changed
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    pub fn remove_observer<O: ?Sized>(&self, observer: &Arc<O>) -> GuardResult<bool> {
        let mut observers = self
            .observers
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        match observers.iter().position(|o| same_allocation(o, observer)) {
            Some(index) => {
                observers.remove(index);
                debug!("subject: observer removed ({} registered)", observers.len());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Calls `update(data)` on every observer registered when the call starts.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of observer calls made
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    pub fn notify(&self, data: &T) -> GuardResult<usize> {
        let snapshot: Vec<Arc<dyn Observer<T>>> = {
            let observers = self
                .observers
                .try_lock()
                .map_err(|_| GuardError::ContentionFailure)?;
            observers.clone()
        };

        trace!("subject: notifying {} observer(s)", snapshot.len());
        for observer in &snapshot {
            observer.update(data);
        }
        Ok(snapshot.len())
    }

    /// Number of registrations, counting duplicates.
    pub fn observer_count(&self) -> GuardResult<usize> {
        let observers = self
            .observers
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(observers.len())
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}
