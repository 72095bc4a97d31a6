//! Timer-driven guards that coalesce repeated calls to an action.
//!
//! Each guard wraps a caller-supplied action and decides, per call, whether to
//! run it now, later, or not at all. Deferred executions go through an injected
//! [`TimerService`](crate::TimerService), which keeps the guards deterministic
//! under test.
//!
//! # Available Guards
//!
//! - **[`DebounceCore`]** - Runs once the calls go quiet for `delay` ticks
//! - **[`ThrottleCore`]** - Runs on the leading edge, then at most once more per
//!   `wait` window with the freshest arguments
//!
//! # Guard Comparison
//!
//! | Guard | Runs inside `call` | Runs from timer | Arguments used |
//! |-------|--------------------|-----------------|----------------|
//! | Debounce | Never | After the quiet period | Last call |
//! | Throttle | First call of an idle period | End of the window | Last call in the window |
//!
//! # Thread Safety
//!
//! Both guards keep their state behind a mutex and use `try_lock`; a call that
//! cannot take the lock immediately returns `ContentionFailure` instead of
//! blocking. The action always runs with no lock held, so it may call back into
//! its own guard.

use std::sync::Arc;

/// Shared, callable form of a wrapped action.
pub(crate) type Action<A> = Arc<dyn Fn(A) + Send + Sync>;

pub mod debounce_core;
pub use debounce_core::DebounceCore;
pub use debounce_core::DebounceCoreConfig;

pub mod throttle_core;
pub use throttle_core::ThrottleCore;
pub use throttle_core::ThrottleCoreConfig;
pub use throttle_core::ThrottleOutcome;
