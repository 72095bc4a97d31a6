use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::rate_limiters::Action;
use crate::timer_service::{TimerId, TimerService};
use crate::{GuardError, GuardResult, Uint};

/// Core implementation of the debounce guard.
///
/// A debounced action runs only once the calls stop arriving for `delay` ticks.
/// Every call cancels the pending timer and schedules a new one carrying the
/// latest arguments, so a burst of calls spaced closer than `delay` collapses
/// into a single execution after the burst ends.
///
/// # Algorithm Behavior
///
/// - At most one timer is pending at any time
/// - Each call replaces the pending arguments and restarts the quiet period
/// - The action runs from the timer, never inside [`call`](DebounceCore::call),
///   even when `delay` is zero
/// - A timer that is still pending when the guard is dropped fires anyway;
///   call [`cancel`](DebounceCore::cancel) first if that is not wanted
///
/// The action runs inside the timer service. If it panics, the panic surfaces
/// in whoever drives the clock, not in the code that called `call`.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use pace_guard_core::rate_limiters::DebounceCore;
/// use pace_guard_core::VirtualScheduler;
///
/// let scheduler = Arc::new(VirtualScheduler::new());
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let debounced = DebounceCore::new(scheduler.clone(), 100, move |query: &'static str| {
///     sink.lock().unwrap().push(query);
/// });
///
/// debounced.call("r").unwrap();
/// scheduler.advance_to(50).unwrap();
/// debounced.call("ru").unwrap();
/// scheduler.advance_to(120).unwrap();
/// debounced.call("rust").unwrap();
///
/// // Nothing has fired yet: every call restarted the quiet period
/// assert!(seen.lock().unwrap().is_empty());
///
/// scheduler.advance_to(220).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec!["rust"]);
/// ```
pub struct DebounceCore<A> {
    /// Length of the quiet period in ticks
    delay: Uint,
    /// Timer facility the pending execution is scheduled on
    timer: Arc<dyn TimerService>,
    /// Wrapped action
    action: Action<A>,
    /// Internal state shared with the scheduled task
    state: Arc<Mutex<DebounceCoreState<A>>>,
}

/// Internal state of the debounce guard
struct DebounceCoreState<A> {
    /// Handle of the pending timer, if any
    pending: Option<TimerId>,
    /// Arguments of the most recent call, consumed when the timer fires
    args: Option<A>,
    /// Bumped on every call, flush and cancel so stale timers become no-ops
    generation: u64,
}

impl<A: Send + 'static> DebounceCore<A> {
    /// Creates a new debounce guard.
    ///
    /// # Parameters
    ///
    /// * `timer` - Timer facility used to defer the action
    /// * `delay` - Quiet period in ticks; zero defers to the next scheduler turn
    /// * `action` - The wrapped action
    pub fn new<F>(timer: Arc<dyn TimerService>, delay: Uint, action: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        DebounceCore {
            delay,
            timer,
            action: Arc::new(action),
            state: Arc::new(Mutex::new(DebounceCoreState {
                pending: None,
                args: None,
                generation: 0,
            })),
        }
    }

    /// Creates a new debounce guard from a [`DebounceCoreConfig`].
    pub fn from_config<F>(config: DebounceCoreConfig, timer: Arc<dyn TimerService>, action: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::new(timer, config.delay, action)
    }

    /// Requests an execution with `args`.
    ///
    /// Cancels any pending execution and schedules a new one `delay` ticks from now.
    ///
    /// # Returns
    /// * `Ok(())` - The execution is scheduled
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    ///   or the timer queue
    pub fn call(&self, args: A) -> GuardResult {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        if let Some(id) = state.pending.take() {
            self.timer.cancel(id);
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        let shared = Arc::clone(&self.state);
        let action = Arc::clone(&self.action);
        let scheduled = self.timer.schedule_after(
            self.delay,
            Box::new(move || {
                let args = {
                    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.generation != generation {
                        return;
                    }
                    state.pending = None;
                    state.args.take()
                };
                if let Some(args) = args {
                    trace!("debounce: quiet period elapsed, running action");
                    action(args);
                }
            }),
        );

        match scheduled {
            Ok(id) => {
                state.pending = Some(id);
                state.args = Some(args);
                Ok(())
            }
            Err(e) => {
                state.args = None;
                Err(e)
            }
        }
    }

    /// Cancels the pending execution, if any.
    ///
    /// # Returns
    /// * `Ok(true)` - A pending execution was dropped
    /// * `Ok(false)` - Nothing was pending
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    pub fn cancel(&self) -> GuardResult<bool> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        state.generation = state.generation.wrapping_add(1);
        state.args = None;
        match state.pending.take() {
            Some(id) => {
                self.timer.cancel(id);
                debug!("debounce: pending execution cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Runs the pending execution right away instead of waiting for the timer.
    ///
    /// # Returns
    /// * `Ok(true)` - The action ran with the latest arguments
    /// * `Ok(false)` - Nothing was pending
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    pub fn flush(&self) -> GuardResult<bool> {
        let args = {
            let mut state = self
                .state
                .try_lock()
                .map_err(|_| GuardError::ContentionFailure)?;

            state.generation = state.generation.wrapping_add(1);
            if let Some(id) = state.pending.take() {
                self.timer.cancel(id);
            }
            state.args.take()
        };

        match args {
            Some(args) => {
                (self.action)(args);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns whether an execution is waiting for its timer.
    pub fn is_pending(&self) -> GuardResult<bool> {
        let state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(state.pending.is_some())
    }

    /// Quiet period in ticks.
    #[inline(always)]
    pub fn delay(&self) -> Uint {
        self.delay
    }
}

/// Configuration structure for creating a `DebounceCore` guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceCoreConfig {
    /// Quiet period in ticks.
    pub delay: Uint,
}

impl DebounceCoreConfig {
    /// Creates a new configuration instance.
    pub fn new(delay: Uint) -> Self {
        Self { delay }
    }
}
