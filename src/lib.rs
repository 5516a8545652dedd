//! Clara - An embeddable in-memory key-value store
//!
//! Entries can expire after a duration, remove themselves after a number of
//! reads, be stored under hashed keys or values, and be synchronized with a
//! JSON snapshot file.
//!
//! ```rust
//! use clara::{KeyOptions, SetOptions, Store, StoreError};
//!
//! let mut store = Store::new();
//! store.set("otp", "491823", &SetOptions::new().limit(1).expires_in("5m")).unwrap();
//!
//! assert!(store.get("otp", &KeyOptions::default()).unwrap().is_some());
//! assert!(matches!(
//!     store.get("otp", &KeyOptions::default()),
//!     Err(StoreError::NotFound(_))
//! ));
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod hash;
pub mod persist;
pub mod shared;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use hash::{OneWayHash, Sha256Hash};
pub use persist::MergePolicy;
pub use shared::SharedStore;
pub use store::{Entry, EntryOptions, ExpiresIn, KeyOptions, SetOptions, Store, StoreStats};
