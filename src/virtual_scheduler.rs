use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::timer_service::{Task, TimerId, TimerService};
use crate::{GuardError, GuardResult, Uint};

/// Deterministic, virtual-time implementation of [`TimerService`].
///
/// The clock only moves when the owner calls [`advance_to`](VirtualScheduler::advance_to),
/// [`advance_by`](VirtualScheduler::advance_by) or [`run_pending`](VirtualScheduler::run_pending).
/// This models a single-threaded event loop: scheduled tasks run later, one at a
/// time, in order of their due tick and then in the order they were scheduled.
///
/// # Behavior
///
/// - A task scheduled with delay `d` at tick `t` becomes due at `t + d`
/// - Zero-delay tasks are deferred to the next advance, never run inline
/// - While advancing, `now()` reports the due tick of the task being run
/// - Tasks scheduled by a running task are eligible in the same advance if due
/// - No lock is held while a task runs
/// - The clock never moves backwards, even when a task advances it further
///
/// A panicking task unwinds out of `advance_*` into whoever is driving the
/// clock. The code that scheduled the work never observes the failure.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use pace_guard_core::{TimerService, VirtualScheduler};
///
/// let scheduler = VirtualScheduler::new();
/// let fired = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&fired);
///
/// scheduler.schedule_after(10, Box::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// })).unwrap();
///
/// assert_eq!(scheduler.advance_to(9), Ok(0));
/// assert_eq!(scheduler.advance_to(10), Ok(1));
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct VirtualScheduler {
    /// Clock and task queue protected by mutex for thread safety
    state: Mutex<VirtualSchedulerState>,
}

/// Internal state of the virtual scheduler
struct VirtualSchedulerState {
    /// Current virtual tick
    now: Uint,
    /// Next id to hand out
    next_id: u64,
    /// Pending tasks keyed by (due tick, id)
    queue: BTreeMap<(Uint, TimerId), Task>,
    /// Due tick of every pending id, for cancellation
    due_by_id: HashMap<TimerId, Uint>,
}

impl VirtualSchedulerState {
    /// Removes and returns the earliest task due at or before `limit`.
    fn pop_due(&mut self, limit: Uint) -> Option<(Uint, TimerId, Task)> {
        let (&(due, id), _) = self.queue.first_key_value()?;
        if due > limit {
            return None;
        }
        let task = self.queue.remove(&(due, id))?;
        self.due_by_id.remove(&id);
        Some((due, id, task))
    }
}

impl VirtualScheduler {
    /// Creates a scheduler whose clock starts at tick 0.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a scheduler whose clock starts at `tick`.
    pub fn starting_at(tick: Uint) -> Self {
        VirtualScheduler {
            state: Mutex::new(VirtualSchedulerState {
                now: tick,
                next_id: 0,
                queue: BTreeMap::new(),
                due_by_id: HashMap::new(),
            }),
        }
    }

    /// Blocking access for short, infallible bookkeeping.
    fn lock_state(&self) -> MutexGuard<'_, VirtualSchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the clock forward to `tick`, running every task due on the way.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of tasks that ran
    /// * `Err(GuardError::ExpiredTick)` - If `tick` is earlier than the current tick
    /// * `Err(GuardError::ContentionFailure)` - If unable to acquire the internal lock
    pub fn advance_to(&self, tick: Uint) -> GuardResult<usize> {
        {
            let state = self
                .state
                .try_lock()
                .map_err(|_| GuardError::ContentionFailure)?;
            if tick < state.now {
                return Err(GuardError::ExpiredTick {
                    min_acceptable_tick: state.now,
                });
            }
        }

        let mut fired = 0;
        loop {
            let task = {
                let mut state = self
                    .state
                    .try_lock()
                    .map_err(|_| GuardError::ContentionFailure)?;
                match state.pop_due(tick) {
                    Some((due, id, task)) => {
                        // A nested advance may already be past `due`
                        state.now = state.now.max(due);
                        trace!("virtual scheduler: firing timer {} at tick {}", id.0, due);
                        task
                    }
                    None => {
                        state.now = state.now.max(tick);
                        break;
                    }
                }
            };
            task();
            fired += 1;
        }
        Ok(fired)
    }

    /// Moves the clock forward by `delta` ticks. See [`advance_to`](Self::advance_to).
    pub fn advance_by(&self, delta: Uint) -> GuardResult<usize> {
        let now = self.lock_state().now;
        self.advance_to(now.saturating_add(delta))
    }

    /// Runs tasks that are already due without moving the clock.
    ///
    /// This is the "next turn of the event loop" for zero-delay tasks.
    pub fn run_pending(&self) -> GuardResult<usize> {
        let now = self.lock_state().now;
        self.advance_to(now)
    }

    /// Number of tasks waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// Due tick of the earliest pending task, if any.
    pub fn next_due(&self) -> Option<Uint> {
        self.lock_state()
            .queue
            .first_key_value()
            .map(|(&(due, _), _)| due)
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for VirtualScheduler {
    #[inline]
    fn now(&self) -> Uint {
        self.lock_state().now
    }

    fn schedule_after(&self, delay: Uint, task: Task) -> GuardResult<TimerId> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| GuardError::ContentionFailure)?;

        let id = TimerId(state.next_id);
        state.next_id += 1;
        let due = state.now.saturating_add(delay);
        state.queue.insert((due, id), task);
        state.due_by_id.insert(id, due);

        debug!("virtual scheduler: timer {} scheduled for tick {}", id.0, due);
        Ok(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.lock_state();
        match state.due_by_id.remove(&id) {
            Some(due) => {
                state.queue.remove(&(due, id));
                debug!("virtual scheduler: timer {} cancelled", id.0);
                true
            }
            None => false,
        }
    }
}
