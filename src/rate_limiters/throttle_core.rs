use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::rate_limiters::Action;
use crate::timer_service::{TimerId, TimerService};
use crate::{GuardError, GuardResult, Uint};

/// What a call to [`ThrottleCore::call`] did with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleOutcome {
    /// The action ran immediately (leading edge).
    Executed,
    /// The call is queued as the trailing execution of the current window.
    Scheduled {
        /// Tick at which the trailing execution fires.
        fire_at: Uint,
    },
}

/// Core implementation of the leading + coalesced trailing throttle.
///
/// The first call in an idle period runs the action immediately and opens a
/// cooldown window of `wait` ticks. Calls inside the window replace one shared
/// trailing execution, which fires when the window closes with the arguments
/// of the most recent call.
///
/// # Algorithm Behavior
///
/// - Cooldown holds while `now - last_execution < wait`
/// - Out of cooldown the action runs inside [`call`](ThrottleCore::call) and any
///   stale trailing execution is dropped
/// - In cooldown the trailing timer is rescheduled for
///   `wait - (now - last_execution)` ticks from now with the latest arguments
/// - When the trailing timer fires it re-checks `now - last_execution >= wait`
///   before running, then records the execution tick
/// - At most one trailing execution is queued per window
///
/// Arguments are captured when the trailing call is scheduled; staleness is
/// judged when it fires.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use pace_guard_core::rate_limiters::{ThrottleCore, ThrottleOutcome};
/// use pace_guard_core::VirtualScheduler;
///
/// let scheduler = Arc::new(VirtualScheduler::new());
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let throttled = ThrottleCore::new(scheduler.clone(), 100, move |x: u32| {
///     sink.lock().unwrap().push(x);
/// });
///
/// // Leading edge runs right away
/// assert_eq!(throttled.call(1), Ok(ThrottleOutcome::Executed));
///
/// scheduler.advance_to(30).unwrap();
/// assert_eq!(throttled.call(2), Ok(ThrottleOutcome::Scheduled { fire_at: 100 }));
/// scheduler.advance_to(60).unwrap();
/// throttled.call(3).unwrap();
///
/// // Trailing edge fires once, with the latest arguments
/// scheduler.advance_to(100).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
/// ```
pub struct ThrottleCore<A> {
    /// Minimum number of ticks between two executions
    wait: Uint,
    /// Timer facility used for the clock and the trailing execution
    timer: Arc<dyn TimerService>,
    /// Wrapped action
    action: Action<A>,
    /// Internal state shared with the trailing task
    state: Arc<Mutex<ThrottleCoreState<A>>>,
}

/// Internal state of the throttle guard
struct ThrottleCoreState<A> {
    /// Tick of the most recent execution
    last_execution: Option<Uint>,
    /// Handle of the queued trailing execution
    trailing: Option<TimerId>,
    /// Arguments of the queued trailing execution
    trailing_args: Option<A>,
    /// Bumped whenever the trailing slot changes so stale timers become no-ops
    generation: u64,
}

impl<A> ThrottleCoreState<A> {
    /// Ticks left in the cooldown window, or `None` when idle.
    #[inline(always)]
    fn cooldown_remaining(&self, now: Uint, wait: Uint) -> Option<Uint> {
        let last = self.last_execution?;
        let elapsed = now.saturating_sub(last);
        if elapsed < wait {
            Some(wait - elapsed)
        } else {
            None
        }
    }

    /// Drops the queued trailing execution, returning its timer handle.
    fn clear_trailing(&mut self) -> Option<TimerId> {
        self.generation = self.generation.wrapping_add(1);
        self.trailing_args = None;
        self.trailing.take()
    }
}

impl<A: Send + 'static> ThrottleCore<A> {
    /// Creates a new throttle guard.
    ///
    /// # Parameters
    ///
    /// * `timer` - Timer facility used for the clock and the trailing execution
    /// * `wait` - Minimum number of ticks between two executions
    /// * `action` - The wrapped action
    pub fn new<F>(timer: Arc<dyn TimerService>, wait: Uint, action: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        ThrottleCore {
            wait,
            timer,
            action: Arc::new(action),
            state: Arc::new(Mutex::new(ThrottleCoreState {
                last_execution: None,
                trailing: None,
                trailing_args: None,
                generation: 0,
            })),
        }
    }

    /// Creates a new throttle guard from a [`ThrottleCoreConfig`].
    pub fn from_config<F>(config: ThrottleCoreConfig, timer: Arc<dyn TimerService>, action: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::new(timer, config.wait, action)
    }

    /// Requests an execution with `args`.
    ///
    /// # Returns
    /// * `Ok(ThrottleOutcome::Executed)` - The action ran before this call returned
    /// * `Ok(ThrottleOutcome::Scheduled { fire_at })` - The arguments replaced the
    ///   trailing execution of the current window
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    ///   or the timer queue
    pub fn call(&self, args: A) -> GuardResult<ThrottleOutcome> {
        let now = self.timer.now();
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        let cooldown = state.cooldown_remaining(now, self.wait);
        let remaining = match cooldown {
            Some(remaining) => remaining,
            None => {
                if let Some(id) = state.clear_trailing() {
                    self.timer.cancel(id);
                }
                state.last_execution = Some(now);
                drop(state);

                trace!("throttle: leading execution at tick {}", now);
                (self.action)(args);
                return Ok(ThrottleOutcome::Executed);
            }
        };

        if let Some(id) = state.clear_trailing() {
            self.timer.cancel(id);
        }
        let generation = state.generation;

        let shared = Arc::clone(&self.state);
        let action = Arc::clone(&self.action);
        // The timer's queue owns this task, so hold the timer weakly
        let timer = Arc::downgrade(&self.timer);
        let wait = self.wait;
        let id = self.timer.schedule_after(
            remaining,
            Box::new(move || {
                let Some(timer) = timer.upgrade() else {
                    return;
                };
                let fire_at = timer.now();
                drop(timer);
                let args = {
                    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.generation != generation {
                        return;
                    }
                    state.trailing = None;
                    let args = state.trailing_args.take();
                    if state.cooldown_remaining(fire_at, wait).is_some() {
                        trace!("throttle: trailing call at tick {} still in cooldown, dropped", fire_at);
                        return;
                    }
                    state.last_execution = Some(fire_at);
                    args
                };
                if let Some(args) = args {
                    trace!("throttle: trailing execution at tick {}", fire_at);
                    action(args);
                }
            }),
        )?;

        state.trailing = Some(id);
        state.trailing_args = Some(args);
        let fire_at = now.saturating_add(remaining);
        debug!("throttle: trailing execution queued for tick {}", fire_at);
        Ok(ThrottleOutcome::Scheduled { fire_at })
    }

    /// Drops the queued trailing execution, if any.
    ///
    /// The cooldown window itself is left untouched.
    pub fn cancel(&self) -> GuardResult<bool> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        match state.clear_trailing() {
            Some(id) => {
                self.timer.cancel(id);
                debug!("throttle: trailing execution cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns whether a call made now would be queued rather than run.
    pub fn is_cooling_down(&self) -> GuardResult<bool> {
        let now = self.timer.now();
        let state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(state.cooldown_remaining(now, self.wait).is_some())
    }

    /// Returns whether a trailing execution is queued.
    pub fn has_trailing(&self) -> GuardResult<bool> {
        let state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(state.trailing.is_some())
    }

    /// Tick of the most recent execution.
    pub fn last_execution(&self) -> GuardResult<Option<Uint>> {
        let state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        Ok(state.last_execution)
    }

    /// Minimum number of ticks between two executions.
    #[inline(always)]
    pub fn wait(&self) -> Uint {
        self.wait
    }
}

/// Configuration structure for creating a `ThrottleCore` guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleCoreConfig {
    /// Minimum number of ticks between two executions.
    pub wait: Uint,
}

impl ThrottleCoreConfig {
    /// Creates a new configuration instance.
    pub fn new(wait: Uint) -> Self {
        Self { wait }
    }
}

impl Default for ThrottleCoreConfig {
    /// 300 ticks, the customary default for pointer-move throttling in milliseconds.
    fn default() -> Self {
        Self { wait: 300 }
    }
}
