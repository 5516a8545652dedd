//! One-Way Hash Module
//!
//! Pluggable digest used to obfuscate keys and values before storage.

use std::fmt::Debug;

use serde_json::Value;
use sha2::{Digest, Sha256};

// == One-Way Hash ==
/// A deterministic, one-way digest producing a printable string.
pub trait OneWayHash: Send + Sync + Debug {
    /// Hashes `input` and returns the digest as text.
    fn digest(&self, input: &[u8]) -> String;
}

/// SHA-256 digest rendered as lowercase hex. The store default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hash;

impl OneWayHash for Sha256Hash {
    fn digest(&self, input: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input);
        format!("{:x}", hasher.finalize())
    }
}

// == Transforms ==
/// Digest of `key ++ salt`, an absent salt being the empty string.
pub fn hash_key(hasher: &dyn OneWayHash, key: &str, salt: Option<&str>) -> String {
    let mut input = String::with_capacity(key.len() + salt.map_or(0, str::len));
    input.push_str(key);
    input.push_str(salt.unwrap_or_default());
    hasher.digest(input.as_bytes())
}

/// Digest of a payload. Strings hash their raw text, anything else hashes
/// its compact JSON encoding.
pub fn hash_value(hasher: &dyn OneWayHash, value: &Value) -> Value {
    let digest = match value {
        Value::String(s) => hasher.digest(s.as_bytes()),
        other => hasher.digest(other.to_string().as_bytes()),
    };
    Value::String(digest)
}
