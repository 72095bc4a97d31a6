use std::sync::{Arc, Mutex};

use log::{debug, trace};

use crate::reactive::same_allocation;
use crate::{GuardError, GuardResult};

/// Observer callback held by an [`ObservableStore`].
pub type StoreObserver<A, R> = Arc<dyn Fn(&A) -> R + Send + Sync>;

/// Set of callable observers that can also collect their return values.
///
/// Each observer is stored at most once; identity is the `Arc` allocation, so
/// two separately allocated closures with the same body are distinct observers.
/// Iteration order is insertion order, which makes the output of
/// [`notify_and_return`](ObservableStore::notify_and_return) stable.
///
/// Notification works on a snapshot, as for [`Subject`](crate::reactive::Subject).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use pace_guard_core::reactive::{ObservableStore, StoreObserver};
///
/// let store = ObservableStore::<u32, u32>::new();
/// let double: StoreObserver<u32, u32> = Arc::new(|x: &u32| x * 2);
/// let square: StoreObserver<u32, u32> = Arc::new(|x: &u32| x * x);
///
/// assert_eq!(store.add_observer(double.clone()), Ok(true));
/// assert_eq!(store.add_observer(square), Ok(true));
/// // Same allocation again: ignored
/// assert_eq!(store.add_observer(double), Ok(false));
///
/// assert_eq!(store.notify_and_return(&3), Ok(vec![6, 9]));
/// ```
pub struct ObservableStore<A, R = ()> {
    observers: Mutex<Vec<StoreObserver<A, R>>>,
}

impl<A, R> ObservableStore<A, R> {
    /// Creates an empty store.
    pub fn new() -> Self {
        ObservableStore {
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Adds `observer` unless that exact allocation is already present.
    ///
    /// Returns `Ok(true)` if the observer was inserted.
    pub fn add_observer(&self, observer: StoreObserver<A, R>) -> GuardResult<bool> {
        let mut observers = self
            .observers
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        if observers.iter().any(|o| same_allocation(o, &observer)) {
            return Ok(false);
        }
        observers.push(observer);
        debug!("observable store: observer added ({} registered)", observers.len());
        Ok(true)
    }

    /// Removes `observer`. Returns `Ok(false)` if it was not present.
    pub fn remove_observer<F: ?Sized>(&self, observer: &Arc<F>) -> GuardResult<bool> {
        let mut observers = self
            .observers
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        let before = observers.len();
        observers.retain(|o| !same_allocation(o, observer));
        Ok(observers.len() != before)
    }

    fn snapshot(&self) -> GuardResult<Vec<StoreObserver<A, R>>> {
        let observers = self
            .observers
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(observers.clone())
    }

    /// Calls every observer with `args`, discarding the results.
    ///
    /// Returns the number of observers called.
    pub fn notify(&self, args: &A) -> GuardResult<usize> {
        let snapshot = self.snapshot()?;
        trace!("observable store: notifying {} observer(s)", snapshot.len());
        for observer in &snapshot {
            observer(args);
        }
        Ok(snapshot.len())
    }

    /// Calls every observer with `args` and collects the results in insertion order.
    pub fn notify_and_return(&self, args: &A) -> GuardResult<Vec<R>> {
        let snapshot = self.snapshot()?;
        trace!("observable store: collecting from {} observer(s)", snapshot.len());
        Ok(snapshot.iter().map(|observer| observer(args)).collect())
    }

    /// Number of observers.
    pub fn len(&self) -> GuardResult<usize> {
        let observers = self
            .observers
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(observers.len())
    }

    /// Returns whether the store has no observers.
    pub fn is_empty(&self) -> GuardResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<A, R> Default for ObservableStore<A, R> {
    fn default() -> Self {
        Self::new()
    }
}
