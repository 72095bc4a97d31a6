//! Synchronous observer, reactive-value and command primitives.
//!
//! Everything here runs on the caller's thread: a write, a `notify` or an
//! `execute` returns only after every callback it triggers has returned.
//!
//! - **[`Subject`]** / **[`Observer`]** - Ordered registry, duplicates allowed
//! - **[`ObservableStore`]** - Unique callable observers, optionally collecting results
//! - **[`ReactiveCell`]**, **[`ReactiveMap`]** - Values whose writes pass through a veto hook
//! - **[`ReactiveEventCell`]** - Value that announces writes on an [`EventChannel`](crate::EventChannel)
//! - **[`ReactiveFn`]** - Function wrapper that reports each call
//! - **[`Command`]**, **[`CommandExecutor`]**, **[`CommandRegistry`]** - Named actions
//!
//! Registries notify from a snapshot, so callbacks may add or remove observers
//! (themselves included) without disturbing the notification in progress.

use std::sync::Arc;

pub mod command;
pub use command::{Command, CommandCallback, CommandExecutor, CommandRegistry};

pub mod observable_store;
pub use observable_store::{ObservableStore, StoreObserver};

pub mod reactive_value;
pub use reactive_value::{OnMapSet, OnSet, ReactiveCell, ReactiveEventCell, ReactiveFn, ReactiveMap};

pub mod subject;
pub use subject::{ConcreteObserver, Observer, Subject};

/// Identity of an `Arc` is its allocation; vtables are ignored.
#[inline(always)]
pub(crate) fn same_allocation<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}
