use serde::{Deserialize, Serialize};

use pace_guard_core::storage::{KeyValueStorage, MemoryStorage, PrefixedStorage};
use pace_guard_core::StorageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Preferences {
    theme: String,
    font_size: u16,
    recent: Vec<String>,
}

#[test]
fn test_memory_storage_basics() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get_item("missing").unwrap(), None);

    storage.set_item("a", "1").unwrap();
    storage.set_item("b", "2").unwrap();
    storage.set_item("a", "3").unwrap();
    assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("3"));
    assert_eq!(storage.len().unwrap(), 2);

    storage.remove_item("a").unwrap();
    // Absent key: no-op
    storage.remove_item("a").unwrap();
    assert_eq!(storage.keys().unwrap(), vec!["b".to_string()]);

    storage.clear().unwrap();
    assert_eq!(storage.len().unwrap(), 0);
}

#[test]
fn test_memory_storage_clones_share_data() {
    let storage = MemoryStorage::new();
    let other = storage.clone();

    other.set_item("shared", "yes").unwrap();
    assert_eq!(storage.get_item("shared").unwrap().as_deref(), Some("yes"));
}

#[test]
fn test_prefixed_round_trips_struct() {
    let backend = MemoryStorage::new();
    let store = PrefixedStorage::new(backend.clone(), "app:");
    let prefs = Preferences {
        theme: "dark".to_string(),
        font_size: 14,
        recent: vec!["notes.md".to_string()],
    };

    store.set("prefs", &prefs).unwrap();
    assert_eq!(store.get::<Preferences>("prefs").unwrap(), Some(prefs));

    // Stored as JSON under the prefixed key
    let raw = backend.get_item("app:prefs").unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["theme"], "dark");
    assert_eq!(value["font_size"], 14);
    assert_eq!(store.prefix(), "app:");
}

#[test]
fn test_prefixed_accepts_unsized_values() {
    let store = PrefixedStorage::new(MemoryStorage::new(), "p:");
    store.set("greeting", "hello").unwrap();
    store.set("digits", &[1, 2, 3][..]).unwrap();

    assert_eq!(store.get::<String>("greeting").unwrap().as_deref(), Some("hello"));
    assert_eq!(store.get::<Vec<u8>>("digits").unwrap(), Some(vec![1, 2, 3]));
}

#[test]
fn test_prefixed_malformed_json() {
    let backend = MemoryStorage::new();
    backend.set_item("app:broken", "{not json").unwrap();
    backend.set_item("app:count", "\"seven\"").unwrap();

    let store = PrefixedStorage::new(backend, "app:");
    assert!(matches!(
        store.get::<u32>("broken"),
        Err(StorageError::Serialization(_))
    ));
    // Valid JSON of the wrong shape fails the same way
    assert!(matches!(
        store.get::<u32>("count"),
        Err(StorageError::Serialization(_))
    ));
}

#[test]
fn test_prefixed_remove() {
    let store = PrefixedStorage::new(MemoryStorage::new(), "app:");
    store.set("flag", &true).unwrap();
    store.remove("flag").unwrap();
    assert_eq!(store.get::<bool>("flag").unwrap(), None);
}

#[test]
fn test_prefixed_clear_leaves_other_keys() {
    let backend = MemoryStorage::new();
    let app = PrefixedStorage::new(backend.clone(), "app:");
    let other = PrefixedStorage::new(backend.clone(), "other:");

    app.set("one", &1).unwrap();
    app.set("two", &2).unwrap();
    other.set("one", &10).unwrap();
    backend.set_item("plain", "raw").unwrap();

    app.clear().unwrap();

    assert_eq!(app.get::<i32>("one").unwrap(), None);
    assert_eq!(app.get::<i32>("two").unwrap(), None);
    assert_eq!(other.get::<i32>("one").unwrap(), Some(10));
    assert_eq!(backend.get_item("plain").unwrap().as_deref(), Some("raw"));
    assert_eq!(backend.len().unwrap(), 2);
}
