//! Store Module
//!
//! Provides the in-memory store with expiry, read limits, uniqueness checks
//! and key/value hashing.

mod engine;
mod entry;
mod options;
mod stats;


// Re-export public types
pub use engine::Store;
pub use entry::{current_timestamp_ms, Entry, EntryOptions, Resolution};
pub use options::{ExpiresIn, KeyOptions, SetOptions};
pub use stats::StoreStats;
