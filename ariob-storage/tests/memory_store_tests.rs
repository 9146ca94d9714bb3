use ariob_storage::{KeyValueStore, KeyValueStoreExt, MemoryStore};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Config {
    timeout_ms: u64,
    enabled: bool,
}

// ── Basic operations ─────────────────────────────────────────────

#[test]
fn get_missing_is_none() {
    let store = MemoryStore::new();
    assert_eq!(store.get("nope").unwrap(), None);
}

#[test]
fn set_then_get() {
    let store = MemoryStore::new();
    store.set("k", b"v").unwrap();
    assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
    assert!(store.contains("k").unwrap());
}

#[test]
fn set_overwrites() {
    let store = MemoryStore::new();
    store.set("k", b"one").unwrap();
    store.set("k", b"two").unwrap();
    assert_eq!(store.get("k").unwrap(), Some(b"two".to_vec()));
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_missing_is_ok() {
    let store = MemoryStore::new();
    store.remove("ghost").unwrap();
}

#[test]
fn clear_empties_store() {
    let store = MemoryStore::new();
    store.set("a", b"1").unwrap();
    store.set("b", b"2").unwrap();
    store.clear().unwrap();
    assert!(store.is_empty());
}

// ── Helpers ──────────────────────────────────────────────────────

#[test]
fn json_roundtrip() {
    let store = MemoryStore::new();
    let config = Config {
        timeout_ms: 500,
        enabled: true,
    };
    store.set_json("cfg", &config).unwrap();
    assert_eq!(store.get_json::<Config>("cfg").unwrap(), Some(config));
}

#[test]
fn json_of_wrong_shape_is_error() {
    let store = MemoryStore::new();
    store.set_string("cfg", "[1,2]").unwrap();
    assert!(store.get_json::<Config>("cfg").is_err());
}

#[test]
fn non_utf8_string_is_error() {
    let store = MemoryStore::new();
    store.set("bin", &[0xff, 0xfe]).unwrap();
    assert!(store.get_string("bin").is_err());
}

#[test]
fn keys_with_prefix_filters() {
    let store = MemoryStore::new();
    store.set_string("ariob_encrypted_a", "1").unwrap();
    store.set_string("ariob_integrity_a", "2").unwrap();
    store.set_string("ariob_encrypted_b", "3").unwrap();

    let mut keys = store.keys_with_prefix("ariob_encrypted_").unwrap();
    keys.sort();
    assert_eq!(keys, vec!["ariob_encrypted_a", "ariob_encrypted_b"]);
}

#[test]
fn helpers_work_through_trait_object() {
    let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
    store.set_string("k", "hello").unwrap();
    assert_eq!(store.get_string("k").unwrap().as_deref(), Some("hello"));
}
