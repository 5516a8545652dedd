//! Store Engine Module
//!
//! Main engine combining the HashMap of entries with expiry, read limits,
//! uniqueness checks and key/value hashing.

use std::collections::hash_map::Entry as Slot;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::hash::{hash_key, hash_value, OneWayHash, Sha256Hash};
use crate::store::entry::{current_timestamp_ms, Resolution};
use crate::store::{Entry, EntryOptions, ExpiresIn, KeyOptions, SetOptions, StoreStats};

/// What a read found, computed while the slot is borrowed.
enum ReadOutcome {
    Missing,
    Expired,
    Value { value: Value, exhausted: bool },
}

// == Store ==
/// In-memory key-value store.
///
/// The store owns its entries and does no locking of its own; wrap it in
/// [`SharedStore`](crate::SharedStore) to share it between tasks.
///
/// Expired entries are evicted lazily when `get`, `get_all` or a unique
/// write come across them. There is no background sweep.
#[derive(Debug)]
pub struct Store {
    /// Key-value storage
    entries: HashMap<String, Entry>,
    /// Error, cache-mode and persistence settings
    config: StoreConfig,
    /// Digest used for hashed keys and values
    hasher: Arc<dyn OneWayHash>,
    /// Access statistics
    stats: StoreStats,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    // == Constructor ==
    /// Creates an empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            hasher: Arc::new(Sha256Hash),
            stats: StoreStats::new(),
        }
    }

    /// Replaces the digest used for hashed keys and values.
    ///
    /// Entries already stored under the previous digest are not rehashed.
    pub fn with_hasher(mut self, hasher: impl OneWayHash + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    // == Configuration ==
    /// Returns the current configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // == Toggles ==
    /// Policy failures are returned as errors.
    pub fn errors_on(&mut self) {
        self.config.errors_enabled = true;
    }

    /// Policy failures are silenced: reads return `Ok(None)`, bad options
    /// are ignored and rejected unique writes are dropped.
    pub fn errors_off(&mut self) {
        self.config.errors_enabled = false;
    }

    /// Writes without an explicit expiry receive the default TTL.
    pub fn cache_mode_on(&mut self) {
        self.config.cache_mode = true;
    }

    /// Writes without an explicit expiry get none.
    pub fn cache_mode_off(&mut self) {
        self.config.cache_mode = false;
    }

    // == Default TTL ==
    /// Sets the TTL applied in cache mode. Existing entries keep theirs.
    pub fn set_default_ttl(&mut self, ttl: impl Into<ExpiresIn>) -> Result<()> {
        match ttl.into().to_duration() {
            Ok(duration) => {
                self.config.default_ttl = duration;
                Ok(())
            }
            Err(err) => self.suppress(err, ()),
        }
    }

    /// Sets the snapshot file used by flush and load.
    pub fn set_disk_file(&mut self, path: impl Into<PathBuf>) {
        self.config.disk_file = path.into();
    }

    // == Set ==
    /// Stores a value, overwriting any entry at the resolved key.
    ///
    /// # Arguments
    /// * `key` - The caller's key, hashed first when `options.hash_key` is set
    /// * `value` - The payload, hashed first when `options.hash_value` is set
    /// * `options` - Expiry, limit, uniqueness and hashing for this write
    ///
    /// # Errors
    /// `Configuration` for an unparseable `expires_in` or a non-positive
    /// `limit`, `UniqueValueViolation` when `unique_value` is set and another
    /// entry already holds the value. With errors off, a bad option is
    /// dropped and the write proceeds, and a unique violation drops the write.
    pub fn set(&mut self, key: &str, value: impl Into<Value>, options: &SetOptions) -> Result<()> {
        let key = self.resolve_key(key, &options.key_options());
        self.insert_resolved(key, value.into(), options)
    }

    /// Stores a value using a dynamic JSON option bag.
    ///
    /// See [`SetOptions::from_json`] for the recognized fields. With errors
    /// on, the first malformed field fails the write; with errors off,
    /// malformed fields are ignored.
    pub fn set_with_json_options(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        options: &Value,
    ) -> Result<()> {
        let (options, errors) = SetOptions::from_json(options);
        for err in errors {
            self.suppress(err, ())?;
        }
        self.set(key, value, &options)
    }

    // == Set If Absent ==
    /// Stores a value only if the resolved key is not present.
    ///
    /// Returns true if the entry was written. Presence is checked the same
    /// way as [`Store::exists`].
    pub fn set_if_absent(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        options: &SetOptions,
    ) -> Result<bool> {
        let key = self.resolve_key(key, &options.key_options());
        if self.entries.contains_key(&key) {
            return Ok(false);
        }
        self.insert_resolved(key.clone(), value.into(), options)?;
        Ok(self.entries.contains_key(&key))
    }

    fn insert_resolved(&mut self, key: String, value: Value, options: &SetOptions) -> Result<()> {
        let now = current_timestamp_ms();
        let value = if options.hash_value {
            hash_value(self.hasher.as_ref(), &value)
        } else {
            value
        };

        let expires_in = match &options.expires_in {
            Some(expires_in) => match expires_in.to_duration() {
                Ok(duration) => Some(duration),
                Err(err) => self.suppress(err, None)?,
            },
            None => None,
        };
        let expires_in = match expires_in {
            Some(duration) => Some(duration),
            None if self.config.cache_mode => Some(self.config.default_ttl),
            None => None,
        };
        let expires_at = expires_in
            .map(|d| now.saturating_add(i64::try_from(d.as_millis()).unwrap_or(i64::MAX)));

        let limit = match options.limit {
            None => None,
            Some(reads) if reads > 0 => Some(reads as u64),
            Some(reads) => self.suppress(
                StoreError::Configuration(format!(
                    "limit must be an integer larger than 0, got {}",
                    reads
                )),
                None,
            )?,
        };

        if options.unique_value && self.holds_value(&value, now) {
            return self.suppress(StoreError::UniqueValueViolation(key), ());
        }

        debug!(key = %key, ?expires_at, ?limit, "set");
        self.entries
            .insert(key, Entry::new(value, EntryOptions { expires_at, limit }));
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    /// Whether a live entry holds `value`. Expired entries met on the way
    /// are evicted so they cannot block the write.
    fn holds_value(&mut self, value: &Value, now: i64) -> bool {
        self.purge_expired(now);
        self.entries.values().any(|entry| &entry.value == value)
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// An expired entry is evicted and reported as `Expired`. An entry with
    /// a read limit loses one read; the read that uses up the last one still
    /// returns the value and removes the entry.
    ///
    /// # Returns
    /// `Ok(Some(value))` on a hit. `Err(NotFound)` / `Err(Expired)` on a
    /// miss, or `Ok(None)` when errors are off.
    pub fn get(&mut self, key: &str, options: &KeyOptions) -> Result<Option<Value>> {
        let key = self.resolve_key(key, options);
        let now = current_timestamp_ms();

        let outcome = match self.entries.entry(key.clone()) {
            Slot::Vacant(_) => ReadOutcome::Missing,
            Slot::Occupied(mut slot) => match slot.get().resolve(now) {
                Resolution::Expired => {
                    slot.remove();
                    ReadOutcome::Expired
                }
                Resolution::LastRead => ReadOutcome::Value {
                    value: slot.remove().value,
                    exhausted: true,
                },
                Resolution::Live => {
                    let entry = slot.get_mut();
                    if let Some(remaining) = entry.options.limit.as_mut() {
                        *remaining -= 1;
                    }
                    ReadOutcome::Value {
                        value: entry.value.clone(),
                        exhausted: false,
                    }
                }
            },
        };

        match outcome {
            ReadOutcome::Missing => {
                self.stats.record_miss();
                self.suppress(StoreError::NotFound(key), None)
            }
            ReadOutcome::Expired => {
                debug!(key = %key, "evicted expired entry");
                self.stats.record_miss();
                self.stats.record_expired(1);
                self.stats.set_total_entries(self.entries.len());
                self.suppress(StoreError::Expired(key), None)
            }
            ReadOutcome::Value { value, exhausted } => {
                self.stats.record_hit();
                if exhausted {
                    debug!(key = %key, "read limit exhausted, entry removed");
                    self.stats.record_exhausted();
                    self.stats.set_total_entries(self.entries.len());
                }
                Ok(Some(value))
            }
        }
    }

    // == Exists ==
    /// Returns true if the resolved key is present.
    ///
    /// This is a structural check: an entry whose expiry has passed but
    /// which has not been evicted yet still counts as present.
    pub fn exists(&self, key: &str, options: &KeyOptions) -> bool {
        self.entries.contains_key(&self.resolve_key(key, options))
    }

    // == Omit ==
    /// Removes the entry at the resolved key, returning true if one existed.
    pub fn omit(&mut self, key: &str, options: &KeyOptions) -> bool {
        let key = self.resolve_key(key, options);
        let removed = self.entries.remove(&key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Get All ==
    /// Evicts every expired entry, then returns a copy of all entries.
    ///
    /// Read limits are not consumed.
    pub fn get_all(&mut self) -> HashMap<String, Entry> {
        self.purge_expired(current_timestamp_ms());
        self.entries.clone()
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the number of resident entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internal ==
    pub(crate) fn entries(&self) -> &HashMap<String, Entry> {
        &self.entries
    }

    pub(crate) fn replace_entries(&mut self, entries: HashMap<String, Entry>) {
        self.entries = entries;
        self.stats.set_total_entries(self.entries.len());
    }

    /// Removes all entries expired at `now`, returning how many went.
    fn purge_expired(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        if removed > 0 {
            debug!(removed, "evicted expired entries");
            self.stats.record_expired(removed);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    fn resolve_key(&self, key: &str, options: &KeyOptions) -> String {
        if options.hashed_key {
            hash_key(self.hasher.as_ref(), key, options.salt.as_deref())
        } else {
            key.to_string()
        }
    }

    /// Returns the error, or `fallback` when errors are off.
    fn suppress<T>(&self, err: StoreError, fallback: T) -> Result<T> {
        if self.config.errors_enabled {
            Err(err)
        } else {
            warn!(code = err.code(), "suppressed: {}", err);
            Ok(fallback)
        }
    }
}
