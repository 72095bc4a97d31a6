//! Timer capability used by the debounce and throttle guards.
//!
//! Guards never touch a real clock. They are handed a [`TimerService`] and ask it
//! for the current tick, to run a task after a delay, and to cancel a task that
//! has not fired yet. [`VirtualScheduler`](crate::VirtualScheduler) is the
//! deterministic implementation shipped with this crate.

pub use crate::types::Uint;
use crate::GuardResult;

/// Deferred unit of work handed to a [`TimerService`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle identifying one scheduled task.
///
/// Ids are issued in increasing order, so comparing two ids tells which task
/// was scheduled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

impl TimerId {
    /// Returns the raw numeric id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// The core trait for all timer facilities.
///
/// Implementors provide a monotonic clock plus schedule/cancel primitives.
/// Tasks must never run synchronously inside [`schedule_after`](TimerService::schedule_after),
/// even with a zero delay.
pub trait TimerService: Send + Sync {
    /// Returns the current tick.
    fn now(&self) -> Uint;

    /// Schedules `task` to run `delay` ticks from now.
    ///
    /// # Returns
    /// * `Ok(TimerId)` identifying the scheduled task
    /// * `Err(GuardError::ContentionFailure)` if the timer queue is locked
    fn schedule_after(&self, delay: Uint, task: Task) -> GuardResult<TimerId>;

    /// Cancels a pending task.
    ///
    /// Returns `true` if the task was pending and is now removed. Cancelling an
    /// unknown, already-fired or already-cancelled id returns `false`.
    fn cancel(&self, id: TimerId) -> bool;
}
