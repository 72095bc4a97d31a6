//! Tick-driven call guards and synchronous observer primitives.
//!
//! This library provides two small families of building blocks:
//!
//! - **Call guards** that coalesce repeated calls to an action
//!   ([`DebounceCore`](rate_limiters::DebounceCore), [`ThrottleCore`](rate_limiters::ThrottleCore))
//! - **Reactive primitives** that notify observers synchronously
//!   ([`Subject`](reactive::Subject), [`ObservableStore`](reactive::ObservableStore),
//!   [`ReactiveCell`](reactive::ReactiveCell) and friends, [`Command`](reactive::Command))
//!
//! Host facilities are injected as capabilities: a [`TimerService`] for the
//! clock and deferred work, an [`EventChannel`] for named events, and a
//! [`KeyValueStorage`](storage::KeyValueStorage) for persistence.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use pace_guard_core::rate_limiters::DebounceCore;
//! use pace_guard_core::VirtualScheduler;
//!
//! let scheduler = Arc::new(VirtualScheduler::new());
//! let saved = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&saved);
//!
//! // Save the draft once typing pauses for 500 ticks
//! let autosave = DebounceCore::new(scheduler.clone(), 500, move |draft: String| {
//!     *sink.lock().unwrap() = Some(draft);
//! });
//!
//! autosave.call("Hel".to_string()).unwrap();
//! scheduler.advance_by(100).unwrap();
//! autosave.call("Hello".to_string()).unwrap();
//! scheduler.advance_by(500).unwrap();
//!
//! assert_eq!(saved.lock().unwrap().as_deref(), Some("Hello"));
//! ```
//!
//! # Core Concepts
//!
//! ## Time Representation
//! All guards use abstract "ticks" to represent time. Map your time source to
//! tick values (milliseconds are the usual choice). [`VirtualScheduler`] gives
//! a fully deterministic clock for tests and simulations.
//!
//! ## Execution Model
//! Everything is cooperative and single-threaded in spirit: deferred work
//! runs when the scheduler is advanced, and notifications fan out
//! synchronously in a fixed order. Types are still `Send + Sync` and guard
//! their state with mutexes.
//!
//! ## Error Handling
//! Operations return typed errors:
//! - **[`GuardError`]** - Lock contention or a clock moved backwards
//! - **[`ReactiveError`]** - A write was vetoed by its hook, or committed but not announced
//! - **[`CommandError`]** - Unknown, duplicate or failing commands
//! - **[`StorageError`]** - JSON encoding problems in storage
//!
//! ## Thread Safety
//! Locks are taken with `try_lock`. If a lock cannot be acquired immediately,
//! `ContentionFailure` is returned rather than blocking. Callbacks always run
//! with no lock held.

pub mod error;
pub mod events;
pub mod rate_limiters;
pub mod reactive;
pub mod storage;
pub mod timer_service;
pub mod types;
pub mod virtual_scheduler;

pub use error::{
    BoxError, CommandError, CommandResult, GuardError, GuardResult, ReactiveError, ReactiveResult,
    StorageError, StorageResult,
};
pub use events::{EventChannel, ListenerId};
pub use timer_service::{Task, TimerId, TimerService};
pub use types::Uint;
pub use virtual_scheduler::VirtualScheduler;
