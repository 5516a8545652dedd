//! Configuration Module
//!
//! Handles loading and managing store configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::duration::parse_human;

/// Default snapshot file name
pub const DEFAULT_DISK_FILE: &str = "clara.json";

/// Default TTL applied in cache mode
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Whether policy failures are reported as errors or silenced
    pub errors_enabled: bool,
    /// Whether writes without an explicit expiry receive `default_ttl`
    pub cache_mode: bool,
    /// TTL applied to writes in cache mode
    pub default_ttl: Duration,
    /// Snapshot file used by flush and load
    pub disk_file: PathBuf,
}

impl StoreConfig {
    /// Creates a new StoreConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CLARA_ERRORS` - Report policy errors (default: true)
    /// - `CLARA_CACHE_MODE` - Apply the default TTL to every write (default: false)
    /// - `CLARA_DEFAULT_TTL` - Human duration or milliseconds (default: 5m)
    /// - `CLARA_DISK_FILE` - Snapshot path (default: clara.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            errors_enabled: env::var("CLARA_ERRORS")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.errors_enabled),
            cache_mode: env::var("CLARA_CACHE_MODE")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.cache_mode),
            default_ttl: env::var("CLARA_DEFAULT_TTL")
                .ok()
                .and_then(|v| parse_human(&v).ok())
                .unwrap_or(defaults.default_ttl),
            disk_file: env::var("CLARA_DISK_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.disk_file),
        }
    }

    /// Sets whether policy failures are reported.
    pub fn with_errors_enabled(mut self, enabled: bool) -> Self {
        self.errors_enabled = enabled;
        self
    }

    /// Sets cache mode.
    pub fn with_cache_mode(mut self, enabled: bool) -> Self {
        self.cache_mode = enabled;
        self
    }

    /// Sets the TTL used in cache mode.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the snapshot file path.
    pub fn with_disk_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_file = path.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            errors_enabled: true,
            cache_mode: false,
            default_ttl: DEFAULT_TTL,
            disk_file: PathBuf::from(DEFAULT_DISK_FILE),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
