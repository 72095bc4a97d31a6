//! error.rs
//! Error and result types for the timing guards, reactive values, commands and storage.

use crate::types::Uint;
use thiserror::Error;

/// Boxed error returned by user callbacks (`on_set` hooks, command callbacks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for timer-driven guards and notification registries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// The internal lock is held by another operation.
    #[error("Contention failure: resource is locked by another operation. Please retry.")]
    ContentionFailure,
    /// The virtual clock was asked to move backwards.
    #[error("Expired tick: minimum acceptable tick is {min_acceptable_tick}.")]
    ExpiredTick {
        min_acceptable_tick: Uint,
    },
}

/// Result type for guard operations.
pub type GuardResult<T = ()> = Result<T, GuardError>;

/// Error type for reactive value writes.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// The `on_set` hook refused the write; the stored value is unchanged.
    #[error("Write to `{key}` rejected: {source}")]
    Rejected {
        key: String,
        #[source]
        source: BoxError,
    },
    /// The internal lock is held by another operation.
    #[error("Contention failure: reactive value is locked by another operation. Please retry.")]
    ContentionFailure,
    /// The write to `key` was committed, but its change event could not be dispatched.
    #[error("Write to `{key}` committed, but the event channel was locked and no listener was notified.")]
    NotDispatched { key: String },
}

/// Result type for reactive value operations.
pub type ReactiveResult<T = ()> = Result<T, ReactiveError>;

/// Error type for command execution and registry bookkeeping.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No command with this name is registered.
    #[error("Unknown command `{name}`.")]
    Unknown { name: String },
    /// A command with this name is already registered.
    #[error("Command `{name}` is already registered.")]
    Duplicate { name: String },
    /// The command callback returned an error.
    #[error("Command `{name}` failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: BoxError,
    },
    /// The registry lock is held by another operation.
    #[error("Contention failure: command registry is locked by another operation. Please retry.")]
    ContentionFailure,
}

/// Result type for command operations.
pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Error type for key-value storage access.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The stored value could not be encoded or decoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The backing store lock is held by another operation.
    #[error("Contention failure: storage is locked by another operation. Please retry.")]
    ContentionFailure,
}

/// Result type for storage operations.
pub type StorageResult<T = ()> = Result<T, StorageError>;
