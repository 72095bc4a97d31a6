use std::sync::{Arc, Mutex};

use pace_guard_core::reactive::{Command, CommandExecutor, CommandRegistry};
use pace_guard_core::CommandError;

fn noop(name: &str, data: u32) -> Command<u32> {
    Command::new(name, data, |_: &u32| Ok(()))
}

#[test]
fn test_equality_by_name_only() {
    assert_eq!(noop("save", 1), noop("save", 2));
    assert_ne!(noop("save", 1), noop("load", 1));

    let failing = Command::new("save", 1, |_: &u32| Err("nope".into()));
    assert_eq!(failing, noop("save", 1));
}

#[test]
fn test_accessors_and_clone() {
    let command = noop("resize", 640);
    assert_eq!(command.name(), "resize");
    assert_eq!(*command.data(), 640);

    let copy = command.clone();
    assert_eq!(copy, command);
    assert_eq!(*copy.data(), 640);
}

#[test]
fn test_executor_passes_data_to_callback() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let lines = vec!["a".to_string(), "b".to_string()];
    let command = Command::new("log", lines, move |lines: &Vec<String>| {
        sink.lock().unwrap().extend(lines.iter().cloned());
        Ok(())
    });

    CommandExecutor::execute(&command).unwrap();
    CommandExecutor::execute(&command).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "a", "b"]);
}

#[test]
fn test_executor_returns_callback_error() {
    let command = Command::new("explode", 3u32, |n: &u32| Err(format!("{} fuses", n).into()));

    match CommandExecutor::execute(&command) {
        Err(CommandError::Failed { name, source }) => {
            assert_eq!(name, "explode");
            assert_eq!(source.to_string(), "3 fuses");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_registry_rejects_duplicate_names() {
    let registry = CommandRegistry::new();
    registry.register(noop("save", 1)).unwrap();

    assert!(matches!(
        registry.register(noop("save", 2)),
        Err(CommandError::Duplicate { ref name }) if name == "save"
    ));

    // The first registration wins
    let stored = registry.get("save").unwrap().unwrap();
    assert_eq!(*stored.data(), 1);
    assert_eq!(registry.len().unwrap(), 1);
}

#[test]
fn test_registry_lookup_and_names() {
    let registry = CommandRegistry::default();
    assert!(registry.is_empty().unwrap());

    for name in ["open", "save", "close"] {
        registry.register(noop(name, 0)).unwrap();
    }

    assert_eq!(registry.names().unwrap(), vec!["open", "save", "close"]);
    assert!(registry.contains("save").unwrap());
    assert!(!registry.contains("print").unwrap());
    assert!(registry.get("print").unwrap().is_none());
}

#[test]
fn test_registry_unregister() {
    let registry = CommandRegistry::new();
    registry.register(noop("open", 0)).unwrap();
    registry.register(noop("save", 0)).unwrap();

    let removed = registry.unregister("open").unwrap();
    assert_eq!(removed.map(|c| c.name().to_string()), Some("open".to_string()));
    assert!(registry.unregister("open").unwrap().is_none());
    assert_eq!(registry.names().unwrap(), vec!["save"]);

    // The name is free again
    registry.register(noop("open", 1)).unwrap();
    assert_eq!(registry.names().unwrap(), vec!["save", "open"]);
}

#[test]
fn test_registry_execute() {
    let total = Arc::new(Mutex::new(0));
    let registry = CommandRegistry::new();

    let sink = Arc::clone(&total);
    registry
        .register(Command::new("add", 4u32, move |n: &u32| {
            *sink.lock().unwrap() += *n;
            Ok(())
        }))
        .unwrap();

    registry.execute("add").unwrap();
    registry.execute("add").unwrap();
    assert_eq!(*total.lock().unwrap(), 8);

    assert!(matches!(
        registry.execute("subtract"),
        Err(CommandError::Unknown { ref name }) if name == "subtract"
    ));
}

#[test]
fn test_registry_callback_may_use_registry() {
    let registry = Arc::new(CommandRegistry::<u32>::new());

    let owner = Arc::clone(&registry);
    registry
        .register(Command::new("install", 0u32, move |_: &u32| {
            owner.register(Command::new("installed", 0u32, |_: &u32| Ok(())))?;
            owner.execute("installed")?;
            Ok(())
        }))
        .unwrap();

    registry.execute("install").unwrap();
    assert_eq!(registry.names().unwrap(), vec!["install", "installed"]);

    // Second run fails inside the callback and surfaces as a failure of `install`
    match registry.execute("install") {
        Err(CommandError::Failed { name, source }) => {
            assert_eq!(name, "install");
            assert_eq!(source.to_string(), "Command `installed` is already registered.");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
