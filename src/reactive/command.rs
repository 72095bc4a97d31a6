use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::{BoxError, CommandError, CommandResult};

/// Callback carried by a [`Command`].
pub type CommandCallback<T> = Arc<dyn Fn(&T) -> Result<(), BoxError> + Send + Sync>;

/// A named action bundled with the data it runs on.
///
/// # Equality
///
/// Two commands are equal when their names are equal. Data and callback are
/// ignored, so `Command::new("save", 1, ..) == Command::new("save", 2, ..)`.
/// [`CommandRegistry`] relies on this to keep names unique.
pub struct Command<T> {
    name: String,
    data: T,
    callback: CommandCallback<T>,
}

impl<T> Command<T> {
    /// Creates a command called `name` that runs `callback(&data)`.
    pub fn new<F>(name: impl Into<String>, data: T, callback: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Command {
            name: name.into(),
            data,
            callback: Arc::new(callback),
        }
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload handed to the callback.
    pub fn data(&self) -> &T {
        &self.data
    }
}

impl<T> PartialEq for Command<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Command<T> {}

impl<T: Clone> Clone for Command<T> {
    fn clone(&self) -> Self {
        Command {
            name: self.name.clone(),
            data: self.data.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Runs commands synchronously on the caller's thread.
///
/// There is no queue and no isolation: an error from the callback is returned
/// to the caller of [`execute`](CommandExecutor::execute) as
/// [`CommandError::Failed`], and a panic unwinds through it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    /// Invokes `command.callback(&command.data)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pace_guard_core::reactive::{Command, CommandExecutor};
    /// use pace_guard_core::CommandError;
    ///
    /// let ok = Command::new("greet", "world", |who: &&str| {
    ///     println!("hello {}", who);
    ///     Ok(())
    /// });
    /// assert!(CommandExecutor::execute(&ok).is_ok());
    ///
    /// let failing = Command::new("explode", (), |_: &()| Err("boom".into()));
    /// assert!(matches!(
    ///     CommandExecutor::execute(&failing),
    ///     Err(CommandError::Failed { .. })
    /// ));
    /// ```
    pub fn execute<T>(command: &Command<T>) -> CommandResult {
        debug!("command `{}`: executing", command.name);
        (command.callback)(&command.data).map_err(|source| {
            warn!("command `{}` failed: {}", command.name, source);
            CommandError::Failed {
                name: command.name.clone(),
                source,
            }
        })
    }
}

/// Explicitly owned table of commands, looked up by name.
///
/// Names are unique and kept in registration order. A registry is built by
/// whoever needs command lookup and dropped with it; there is no global table.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use pace_guard_core::reactive::{Command, CommandRegistry};
/// use pace_guard_core::CommandError;
///
/// let total = Arc::new(AtomicU32::new(0));
/// let registry = CommandRegistry::new();
///
/// let sink = Arc::clone(&total);
/// registry.register(Command::new("add-five", 5u32, move |n: &u32| {
///     sink.fetch_add(*n, Ordering::SeqCst);
///     Ok(())
/// })).unwrap();
///
/// registry.execute("add-five").unwrap();
/// assert_eq!(total.load(Ordering::SeqCst), 5);
///
/// assert!(matches!(registry.execute("missing"), Err(CommandError::Unknown { .. })));
/// ```
pub struct CommandRegistry<T> {
    commands: Mutex<Vec<Arc<Command<T>>>>,
}

impl<T> CommandRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        CommandRegistry {
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Adds `command`, failing with [`CommandError::Duplicate`] if its name is taken.
    pub fn register(&self, command: Command<T>) -> CommandResult {
        let mut commands = self
            .commands
            .try_lock()
            .map_err(|_| CommandError::ContentionFailure)?;

        if commands.iter().any(|existing| **existing == command) {
            return Err(CommandError::Duplicate { name: command.name });
        }
        debug!("command registry: `{}` registered", command.name);
        commands.push(Arc::new(command));
        Ok(())
    }

    /// Removes and returns the command called `name`, if any.
    pub fn unregister(&self, name: &str) -> CommandResult<Option<Arc<Command<T>>>> {
        let mut commands = self
            .commands
            .try_lock()
            .map_err(|_| CommandError::ContentionFailure)?;

        let removed = commands
            .iter()
            .position(|c| c.name == name)
            .map(|index| commands.remove(index));
        if removed.is_some() {
            debug!("command registry: `{}` unregistered", name);
        }
        Ok(removed)
    }

    /// Returns the command called `name`, if any.
    pub fn get(&self, name: &str) -> CommandResult<Option<Arc<Command<T>>>> {
        let commands = self
            .commands
            .try_lock()
            .map_err(|_| CommandError::ContentionFailure)?;

        Ok(commands.iter().find(|c| c.name == name).cloned())
    }

    /// Returns whether a command called `name` is registered.
    pub fn contains(&self, name: &str) -> CommandResult<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Registered names in registration order.
    pub fn names(&self) -> CommandResult<Vec<String>> {
        let commands = self
            .commands
            .try_lock()
            .map_err(|_| CommandError::ContentionFailure)?;

        Ok(commands.iter().map(|c| c.name.clone()).collect())
    }

    /// Looks up `name` and runs it through [`CommandExecutor`].
    ///
    /// The registry lock is released before the callback runs, so the
    /// callback may register or execute other commands.
    pub fn execute(&self, name: &str) -> CommandResult {
        let command = self.get(name)?.ok_or_else(|| CommandError::Unknown {
            name: name.to_string(),
        })?;
        CommandExecutor::execute(&command)
    }

    /// Number of registered commands.
    pub fn len(&self) -> CommandResult<usize> {
        let commands = self
            .commands
            .try_lock()
            .map_err(|_| CommandError::ContentionFailure)?;

        Ok(commands.len())
    }

    /// Returns whether no command is registered.
    pub fn is_empty(&self) -> CommandResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T> Default for CommandRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
