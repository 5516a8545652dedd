//! Store Entry Module
//!
//! Defines the structure for individual entries with expiry and read-limit
//! support, along with the pure policy that decides whether an entry is
//! still readable.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

// == Entry Options ==
/// Policy state attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Absolute expiration timestamp (Unix milliseconds), None = no expiration
    #[serde(
        rename = "expiresIn",
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<i64>,
    /// Remaining successful reads, None = unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl EntryOptions {
    /// Returns true when neither expiry nor limit is set.
    pub fn is_empty(&self) -> bool {
        self.expires_at.is_none() && self.limit.is_none()
    }
}

/// Accepts integer or fractional millisecond timestamps, flooring fractions.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(ms) = raw.as_i64() {
        return Ok(Some(ms));
    }
    match raw.as_f64() {
        Some(ms) if ms.is_finite() => Ok(Some(ms.floor() as i64)),
        _ => Err(D::Error::custom(format!("invalid expiresIn timestamp: {}", raw))),
    }
}

// == Entry ==
/// A stored value together with its policy state.
///
/// Serializes as `{ "value": ..., "options": { "expiresIn"?, "limit"? } }`.
/// Deserialization also accepts a bare value, which becomes an entry with
/// no options. An object is read as a wrapped entry when it has a `value`
/// field and no fields besides `value` and `options`; malformed options on
/// such an object are an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Entry {
    /// The stored value
    pub value: Value,
    /// Expiry and limit state
    pub options: EntryOptions,
}

/// Outcome of evaluating an entry at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Readable, and remains so after this read
    Live,
    /// Readable, but this read exhausts its limit
    LastRead,
    /// Past its expiry; must be evicted and reported as missing
    Expired,
}

impl Entry {
    // == Constructor ==
    /// Creates a new entry.
    pub fn new(value: Value, options: EntryOptions) -> Self {
        Self { value, options }
    }

    /// Creates an entry with no expiry and no limit.
    pub fn plain(value: Value) -> Self {
        Self::new(value, EntryOptions::default())
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time is past its expiration
    /// time; at exactly the expiration time it is still readable.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.options.expires_at {
            Some(expires) => now_ms > expires,
            None => false,
        }
    }

    // == Resolve ==
    /// Decides what a read at `now_ms` does to this entry.
    ///
    /// Time expiry is checked before the read limit.
    pub fn resolve(&self, now_ms: i64) -> Resolution {
        if self.is_expired_at(now_ms) {
            return Resolution::Expired;
        }
        match self.options.limit {
            Some(remaining) if remaining <= 1 => Resolution::LastRead,
            _ => Resolution::Live,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> Option<u64> {
        self.options
            .expires_at
            .map(|expires| expires.saturating_sub(now_ms).max(0) as u64)
    }
}

// == Snapshot Forms ==
impl TryFrom<Value> for Entry {
    type Error = serde_json::Error;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        match raw {
            Value::Object(mut fields) if is_wrapped(&fields) => {
                let value = fields.remove("value").unwrap_or(Value::Null);
                let options = match fields.remove("options") {
                    None | Some(Value::Null) => EntryOptions::default(),
                    Some(options) => serde_json::from_value(options)?,
                };
                Ok(Entry::new(value, options))
            }
            bare => Ok(Entry::plain(bare)),
        }
    }
}

fn is_wrapped(fields: &Map<String, Value>) -> bool {
    fields.contains_key("value") && fields.keys().all(|k| k == "value" || k == "options")
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
