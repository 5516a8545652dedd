//! Integration Tests for Snapshot Persistence
//!
//! Exercises flush and load against real files under each merge policy.

use std::fs;
use std::path::{Path, PathBuf};

use clara::{Entry, KeyOptions, MergePolicy, SetOptions, Store, StoreConfig, StoreError};
use serde_json::{json, Value};
use tempfile::TempDir;

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn store_at(dir: &TempDir) -> (Store, PathBuf) {
    init_tracing();
    let path = dir.path().join("clara.json");
    let store = Store::with_config(StoreConfig::default().with_disk_file(&path));
    (store, path)
}

/// Memory holds `{a: 2, b: 3}`, disk holds `{a: 1}`.
fn seeded(dir: &TempDir) -> (Store, PathBuf) {
    let (mut store, path) = store_at(dir);
    fs::write(&path, r#"{"a": {"value": 1, "options": {}}}"#).unwrap();
    store.set("a", 2, &SetOptions::default()).unwrap();
    store.set("b", 3, &SetOptions::default()).unwrap();
    (store, path)
}

fn read_values(path: &Path) -> Value {
    let raw: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let values = raw
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v["value"].clone()))
        .collect();
    Value::Object(values)
}

fn memory_values(store: &mut Store) -> Value {
    let values = store
        .get_all()
        .into_iter()
        .map(|(k, entry)| (k, entry.value))
        .collect();
    Value::Object(values)
}

// == Flush ==

#[test]
fn test_flush_memory_prior() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);

    store.flush(MergePolicy::MemoryPrior).unwrap();

    assert_eq!(read_values(&path), json!({"a": 2, "b": 3}));
    assert_eq!(memory_values(&mut store), json!({"a": 2, "b": 3}));
}

#[test]
fn test_flush_disk_prior_leaves_memory_alone() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);

    store.flush(MergePolicy::DiskPrior).unwrap();

    assert_eq!(read_values(&path), json!({"a": 1, "b": 3}));
    assert_eq!(memory_values(&mut store), json!({"a": 2, "b": 3}));
}

#[test]
fn test_flush_without_merge_overwrites() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);
    fs::write(&path, r#"{"c": {"value": 9, "options": {}}}"#).unwrap();

    store.flush(MergePolicy::None).unwrap();

    assert_eq!(read_values(&path), json!({"a": 2, "b": 3}));
    assert_eq!(memory_values(&mut store), json!({"a": 2, "b": 3}));
}

#[test]
fn test_flush_missing_file_merges_as_empty() {
    let dir = TempDir::new().unwrap();
    for policy in [MergePolicy::MemoryPrior, MergePolicy::DiskPrior] {
        let (mut store, path) = store_at(&dir);
        let _ = fs::remove_file(&path);
        store.set("a", 2, &SetOptions::default()).unwrap();

        store.flush(policy).unwrap();
        assert_eq!(read_values(&path), json!({"a": 2}));
    }
}

#[test]
fn test_flush_file_shape() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = store_at(&dir);
    store.set("plain", "v", &SetOptions::default()).unwrap();
    store.set("limited", "v", &SetOptions::new().limit(3)).unwrap();
    store.get("limited", &KeyOptions::default()).unwrap();

    store.flush(MergePolicy::None).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains('\t'));
    let raw: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(raw["plain"], json!({"value": "v", "options": {}}));
    assert_eq!(raw["limited"], json!({"value": "v", "options": {"limit": 2}}));
}

#[test]
fn test_flush_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::with_config(
        StoreConfig::default().with_disk_file(dir.path().join("no/such/dir/clara.json")),
    );
    store.errors_off();
    store.set("a", 1, &SetOptions::default()).unwrap();

    // I/O failures propagate even with errors off
    let result = store.flush(MergePolicy::None);
    assert!(matches!(result, Err(StoreError::Io(_))));
}

// == Load ==

#[test]
fn test_load_memory_prior() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);
    let before = fs::read_to_string(&path).unwrap();

    assert_eq!(store.load(MergePolicy::MemoryPrior).unwrap(), 2);

    assert_eq!(memory_values(&mut store), json!({"a": 2, "b": 3}));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_load_disk_prior() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);
    let before = fs::read_to_string(&path).unwrap();

    store.load(MergePolicy::DiskPrior).unwrap();

    assert_eq!(memory_values(&mut store), json!({"a": 1, "b": 3}));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_load_without_merge_replaces_memory() {
    let dir = TempDir::new().unwrap();
    let (mut store, _path) = seeded(&dir);

    store.load(MergePolicy::None).unwrap();

    assert_eq!(memory_values(&mut store), json!({"a": 1}));
}

#[test]
fn test_load_missing_or_empty_file() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);

    fs::remove_file(&path).unwrap();
    store.load(MergePolicy::DiskPrior).unwrap();
    assert_eq!(memory_values(&mut store), json!({"a": 2, "b": 3}));

    fs::write(&path, "").unwrap();
    store.load(MergePolicy::None).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_load_malformed_file_keeps_memory() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);
    fs::write(&path, "{ definitely not json").unwrap();

    let result = store.load(MergePolicy::None);
    assert!(matches!(result, Err(StoreError::Snapshot(_))));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_load_restores_policies() {
    let dir = TempDir::new().unwrap();
    let (mut store, _path) = store_at(&dir);
    store.set("once", "v", &SetOptions::new().limit(1)).unwrap();
    store
        .set("later", "v", &SetOptions::new().expires_in("1h"))
        .unwrap();
    store.flush(MergePolicy::None).unwrap();

    store.clear();
    store.load(MergePolicy::None).unwrap();

    let all = store.get_all();
    assert_eq!(all["once"].options.limit, Some(1));
    assert!(all["later"].options.expires_at.is_some());

    store.get("once", &KeyOptions::default()).unwrap();
    assert!(!store.exists("once", &KeyOptions::default()));
}

#[test]
fn test_load_expired_entries_are_evicted_lazily() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = store_at(&dir);
    fs::write(
        &path,
        r#"{"stale": {"value": "v", "options": {"expiresIn": 1}}, "userOne": "adnan"}"#,
    )
    .unwrap();

    store.load(MergePolicy::None).unwrap();
    assert!(store.exists("stale", &KeyOptions::default()));

    let all = store.get_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all["userOne"], Entry::plain(json!("adnan")));
}

// == Async Variants ==

#[tokio::test]
async fn test_async_flush_and_load() {
    let dir = TempDir::new().unwrap();
    let (mut store, path) = seeded(&dir);

    store.flush_async(MergePolicy::DiskPrior).await.unwrap();
    assert_eq!(read_values(&path), json!({"a": 1, "b": 3}));

    store.load_async(MergePolicy::DiskPrior).await.unwrap();
    assert_eq!(memory_values(&mut store), json!({"a": 1, "b": 3}));
}

#[tokio::test]
async fn test_async_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let (mut store, _path) = store_at(&dir);
    store.set("a", 1, &SetOptions::default()).unwrap();

    assert_eq!(store.load_async(MergePolicy::MemoryPrior).await.unwrap(), 1);
    assert_eq!(store.load_async(MergePolicy::None).await.unwrap(), 0);
}
