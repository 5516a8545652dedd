//! Integration Tests for the Store API
//!
//! Covers the read/write lifecycle through the public interface, with
//! errors both on and off.

use std::thread::sleep;
use std::time::Duration;

use clara::{KeyOptions, SetOptions, SharedStore, Store, StoreConfig, StoreError};
use serde_json::json;

fn plain() -> KeyOptions {
    KeyOptions::default()
}

#[test]
fn test_unwritten_key() {
    let mut store = Store::new();
    let err = store.get("ghost", &plain()).unwrap_err();
    assert_eq!(err.code(), "CLARA_EXISTENCE_ERROR");

    store.errors_off();
    assert_eq!(store.get("ghost", &plain()).unwrap(), None);
}

#[test]
fn test_structured_values_roundtrip() {
    let mut store = Store::new();
    let profile = json!({"name": "adnan", "roles": ["admin"], "age": 30});
    store.set("profile", profile.clone(), &SetOptions::default()).unwrap();
    assert_eq!(store.get("profile", &plain()).unwrap(), Some(profile));
}

#[test]
fn test_expiry_lifecycle() {
    let mut store = Store::new();
    store
        .set("session", "token", &SetOptions::new().expires_in(10u64))
        .unwrap();
    assert_eq!(store.get("session", &plain()).unwrap(), Some(json!("token")));

    sleep(Duration::from_millis(15));

    let err = store.get("session", &plain()).unwrap_err();
    assert!(matches!(err, StoreError::Expired(ref key) if key == "session"));
    assert!(!store.get_all().contains_key("session"));
}

#[test]
fn test_expiry_with_errors_off() {
    let mut store = Store::new();
    store.errors_off();
    store
        .set("session", "token", &SetOptions::new().expires_in("10ms"))
        .unwrap();

    sleep(Duration::from_millis(15));

    assert_eq!(store.get("session", &plain()).unwrap(), None);
    assert!(store.get_all().is_empty());
}

#[test]
fn test_get_all_sweeps_without_a_prior_read() {
    let mut store = Store::new();
    store
        .set("short", 1, &SetOptions::new().expires_in(Duration::from_millis(5)))
        .unwrap();
    store.set("long", 2, &SetOptions::new().expires_in("1h")).unwrap();

    sleep(Duration::from_millis(15));

    // Structural check still sees the lapsed entry
    assert!(store.exists("short", &plain()));
    let all = store.get_all();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["long"]);
    assert!(!store.exists("short", &plain()));
}

#[test]
fn test_limit_lifecycle() {
    let mut store = Store::new();
    store.set("otp", "491823", &SetOptions::new().limit(2)).unwrap();

    assert_eq!(store.get("otp", &plain()).unwrap(), Some(json!("491823")));
    assert_eq!(store.get("otp", &plain()).unwrap(), Some(json!("491823")));
    assert!(matches!(store.get("otp", &plain()), Err(StoreError::NotFound(_))));
}

#[test]
fn test_limit_and_expiry_together() {
    let mut store = Store::new();
    store
        .set("k", "v", &SetOptions::new().limit(5).expires_in(10u64))
        .unwrap();
    assert!(store.get("k", &plain()).unwrap().is_some());

    sleep(Duration::from_millis(15));

    assert!(matches!(store.get("k", &plain()), Err(StoreError::Expired(_))));
}

#[test]
fn test_unique_value_enforcement() {
    let mut store = Store::new();
    store.set("k1", "x", &SetOptions::default()).unwrap();

    let err = store
        .set("k2", "x", &SetOptions::new().unique_value())
        .unwrap_err();
    assert_eq!(err.code(), "CLARA_UNIQUE_VALUE_ERROR");

    store.errors_off();
    store.set("k2", "x", &SetOptions::new().unique_value()).unwrap();
    assert!(!store.exists("k2", &plain()));

    // Overwriting the key that holds the value is still a collision
    store.set("k1", "x", &SetOptions::new().unique_value()).unwrap();
    assert_eq!(store.get("k1", &plain()).unwrap(), Some(json!("x")));
}

#[test]
fn test_configuration_validation() {
    let mut store = Store::new();
    let err = store
        .set_with_json_options("k", "v", &json!({"expiresIn": true}))
        .unwrap_err();
    assert_eq!(err.code(), "CLARA_CONFIGURATION_ERROR");
    assert!(!store.exists("k", &plain()));

    store.errors_off();
    store
        .set_with_json_options("k", "v", &json!({"expiresIn": true}))
        .unwrap();
    assert_eq!(store.get("k", &plain()).unwrap(), Some(json!("v")));
    assert!(store.get_all()["k"].options.expires_at.is_none());
}

#[test]
fn test_json_options_bag() {
    let mut store = Store::new();
    store
        .set_with_json_options(
            "user",
            "adnan",
            &json!({"encodeKey": true, "salt": "s", "encodeValue": true, "limit": 1}),
        )
        .unwrap();

    let lookup = KeyOptions::hashed().with_salt("s");
    let value = store.get("user", &lookup).unwrap().unwrap();
    assert_ne!(value, json!("adnan"));
    assert!(!store.exists("user", &lookup));
}

#[test]
fn test_cache_mode_from_config() {
    let config = StoreConfig::default()
        .with_cache_mode(true)
        .with_default_ttl(Duration::from_millis(10));
    let mut store = Store::with_config(config);

    store.set("cached", "v", &SetOptions::default()).unwrap();
    store
        .set("pinned", "v", &SetOptions::new().expires_in("1h"))
        .unwrap();

    sleep(Duration::from_millis(15));

    assert!(matches!(store.get("cached", &plain()), Err(StoreError::Expired(_))));
    assert_eq!(store.get("pinned", &plain()).unwrap(), Some(json!("v")));
}

#[test]
fn test_toggles_are_not_retroactive() {
    let mut store = Store::new();
    store.set("before", "v", &SetOptions::default()).unwrap();

    store.cache_mode_on();
    store.set_default_ttl(1u64).unwrap();

    sleep(Duration::from_millis(5));

    assert_eq!(store.get("before", &plain()).unwrap(), Some(json!("v")));
}

#[tokio::test]
async fn test_shared_store_serializes_limited_reads() {
    let shared = SharedStore::new(Store::new());
    shared
        .set("ticket", "t", &SetOptions::new().limit(3))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = shared.clone();
            tokio::spawn(async move { shared.get("ticket", &KeyOptions::default()).await })
        })
        .collect();

    let mut hits = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            hits += 1;
        }
    }
    assert_eq!(hits, 3);
}
