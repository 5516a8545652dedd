//! Per-call options for writes and lookups.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::duration::parse_human;
use crate::error::{Result, StoreError};

// == Expires In ==
/// Relative expiry for a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiresIn {
    /// Milliseconds from now
    Millis(u64),
    /// Human-readable duration such as `"1s"` or `"2h 30m"`
    Human(String),
    /// An exact duration
    Duration(Duration),
}

impl ExpiresIn {
    /// Converts to a duration, parsing human strings.
    pub fn to_duration(&self) -> Result<Duration> {
        match self {
            ExpiresIn::Millis(ms) => Ok(Duration::from_millis(*ms)),
            ExpiresIn::Human(text) => parse_human(text),
            ExpiresIn::Duration(d) => Ok(*d),
        }
    }
}

impl From<u64> for ExpiresIn {
    fn from(ms: u64) -> Self {
        ExpiresIn::Millis(ms)
    }
}

impl From<&str> for ExpiresIn {
    fn from(text: &str) -> Self {
        ExpiresIn::Human(text.to_string())
    }
}

impl From<String> for ExpiresIn {
    fn from(text: String) -> Self {
        ExpiresIn::Human(text)
    }
}

impl From<Duration> for ExpiresIn {
    fn from(d: Duration) -> Self {
        ExpiresIn::Duration(d)
    }
}

// == Key Options ==
/// How a caller-supplied key maps to a stored key.
///
/// Lookups on keys written with [`SetOptions::hash_key`] must pass the same
/// salt to find them again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOptions {
    /// Hash the key (with `salt` appended) before lookup
    pub hashed_key: bool,
    /// Salt appended to the key before hashing
    pub salt: Option<String>,
}

impl KeyOptions {
    /// Plain lookup, the key is used as is.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup of a key stored hashed.
    pub fn hashed() -> Self {
        Self {
            hashed_key: true,
            salt: None,
        }
    }

    /// Sets the salt used when the key was stored.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }
}

// == Set Options ==
/// Options for a single write.
///
/// ```rust
/// use clara::SetOptions;
///
/// let options = SetOptions::new().expires_in("1s").limit(3).unique_value();
/// assert_eq!(options.limit, Some(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Store the key as `Hash(key ++ salt)`
    pub hash_key: bool,
    /// Salt appended to the key before hashing
    pub key_salt: Option<String>,
    /// Store `Hash(value)` instead of the value
    pub hash_value: bool,
    /// Reject the write if another entry holds an equal value
    pub unique_value: bool,
    /// Relative expiry; overrides the cache-mode default
    pub expires_in: Option<ExpiresIn>,
    /// Number of reads before the entry removes itself, must be positive
    pub limit: Option<i64>,
}

impl SetOptions {
    // == Builder ==
    /// Creates an option set with no policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the entry under the hash of its key.
    pub fn hash_key(mut self) -> Self {
        self.hash_key = true;
        self
    }

    /// Salt mixed into the key hash. Only used with `hash_key`.
    pub fn key_salt(mut self, salt: impl Into<String>) -> Self {
        self.key_salt = Some(salt.into());
        self
    }

    /// Stores the hash of the value instead of the value.
    pub fn hash_value(mut self) -> Self {
        self.hash_value = true;
        self
    }

    /// Rejects the write when another entry already holds an equal value.
    pub fn unique_value(mut self) -> Self {
        self.unique_value = true;
        self
    }

    /// Expires the entry after the given duration, measured from the write.
    pub fn expires_in(mut self, expires_in: impl Into<ExpiresIn>) -> Self {
        self.expires_in = Some(expires_in.into());
        self
    }

    /// Removes the entry after `reads` successful reads.
    pub fn limit(mut self, reads: i64) -> Self {
        self.limit = Some(reads);
        self
    }

    /// The lookup options matching this write's key transform.
    pub fn key_options(&self) -> KeyOptions {
        KeyOptions {
            hashed_key: self.hash_key,
            salt: self.key_salt.clone(),
        }
    }

    // == From JSON ==
    /// Builds options from a dynamic JSON option bag.
    ///
    /// Recognized keys are `hashKey` (alias `encodeKey`), `keySalt` (alias
    /// `salt`), `hashValue` (alias `encodeValue`), `uniqueValue`,
    /// `expiresIn` and `limit`. Fields with the wrong type or shape are
    /// left out of the returned options and reported as configuration
    /// errors, in field order. `null` fields are treated as absent.
    pub fn from_json(bag: &Value) -> (SetOptions, Vec<StoreError>) {
        let mut options = SetOptions::default();
        let mut errors = Vec::new();

        let fields = match bag {
            Value::Null => return (options, errors),
            Value::Object(fields) => fields,
            _ => {
                errors.push(StoreError::Configuration(
                    "options must be an object".to_string(),
                ));
                return (options, errors);
            }
        };

        match flag(fields, &["hashKey", "encodeKey"]) {
            Ok(v) => options.hash_key = v,
            Err(e) => errors.push(e),
        }
        match fields.get("keySalt").or_else(|| fields.get("salt")) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => options.key_salt = Some(s.clone()),
            Some(_) => errors.push(StoreError::Configuration(
                "keySalt must be a string".to_string(),
            )),
        }
        match flag(fields, &["hashValue", "encodeValue"]) {
            Ok(v) => options.hash_value = v,
            Err(e) => errors.push(e),
        }
        match flag(fields, &["uniqueValue"]) {
            Ok(v) => options.unique_value = v,
            Err(e) => errors.push(e),
        }
        match fields.get("expiresIn") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => options.expires_in = Some(ExpiresIn::Human(s.clone())),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(ms) if ms >= 0.0 && ms.is_finite() => {
                    options.expires_in = Some(ExpiresIn::Millis(ms.round() as u64))
                }
                _ => errors.push(StoreError::Configuration(
                    "expiresIn must not be negative".to_string(),
                )),
            },
            Some(_) => errors.push(StoreError::Configuration(
                "expiresIn must be string or number".to_string(),
            )),
        }
        match fields.get("limit") {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) => match n.as_i64() {
                Some(reads) if reads > 0 => options.limit = Some(reads),
                _ => errors.push(StoreError::Configuration(
                    "limit must be an integer larger than 0".to_string(),
                )),
            },
            Some(_) => errors.push(StoreError::Configuration(
                "limit must be an integer larger than 0".to_string(),
            )),
        }

        (options, errors)
    }
}

/// Reads the first present boolean among `names`.
fn flag(fields: &Map<String, Value>, names: &[&str]) -> Result<bool> {
    match names.iter().find_map(|name| fields.get(*name)) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(StoreError::Configuration(format!(
            "{} must be a boolean",
            names[0]
        ))),
    }
}
