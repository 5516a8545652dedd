//! Shared Store Module
//!
//! A cloneable handle that serializes access to one [`Store`] from many
//! tasks.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::Result;
use crate::persist::{self, snapshot, MergePolicy};
use crate::store::{KeyOptions, SetOptions, Store};

/// Thread-safe handle to a store.
///
/// Every read of a store entry may consume a read limit or evict an expired
/// entry, so `get` takes the write lock. Persistence does its file I/O
/// outside the lock.
///
/// # Example
/// ```rust
/// use clara::{KeyOptions, SetOptions, SharedStore, Store};
///
/// # tokio_test::block_on(async {
/// let shared = SharedStore::new(Store::new());
/// shared.set("user", "adnan", &SetOptions::default()).await.unwrap();
/// let value = shared.get("user", &KeyOptions::default()).await.unwrap();
/// assert_eq!(value, Some(serde_json::json!("adnan")));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<Store>>,
}

impl SharedStore {
    /// Wraps a store for shared use.
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Acquires shared access, for `exists`, `len` and `stats`.
    pub async fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.inner.read().await
    }

    /// Acquires exclusive access.
    pub async fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.inner.write().await
    }

    /// See [`Store::set`].
    pub async fn set(&self, key: &str, value: impl Into<Value>, options: &SetOptions) -> Result<()> {
        self.inner.write().await.set(key, value, options)
    }

    /// See [`Store::get`].
    pub async fn get(&self, key: &str, options: &KeyOptions) -> Result<Option<Value>> {
        self.inner.write().await.get(key, options)
    }

    /// See [`Store::exists`].
    pub async fn exists(&self, key: &str, options: &KeyOptions) -> bool {
        self.inner.read().await.exists(key, options)
    }

    /// See [`Store::omit`].
    pub async fn omit(&self, key: &str, options: &KeyOptions) -> bool {
        self.inner.write().await.omit(key, options)
    }

    // == Flush ==
    /// Writes the store to its snapshot file.
    ///
    /// Memory is copied under the read lock; the file is read and written
    /// after the lock is released.
    pub async fn flush(&self, policy: MergePolicy) -> Result<()> {
        let (path, memory) = {
            let store = self.inner.read().await;
            (store.config().disk_file.clone(), store.entries().clone())
        };

        let disk = if policy.is_merging() {
            snapshot::read_async(&path).await?
        } else {
            persist::Entries::new()
        };
        let payload = persist::flush_payload(&memory, disk, policy)?;
        snapshot::write_async(&path, &payload).await?;
        debug!(path = %path.display(), %policy, "shared flush complete");
        Ok(())
    }

    // == Load ==
    /// Replaces memory with the snapshot file, merged under `policy`.
    ///
    /// The file is read before the write lock is taken, so the merge sees
    /// memory as it is when the lock is acquired.
    pub async fn load(&self, policy: MergePolicy) -> Result<usize> {
        let path = self.inner.read().await.config().disk_file.clone();
        let disk = snapshot::read_async(&path).await?;

        let mut store = self.inner.write().await;
        Ok(store.apply_loaded(disk, policy))
    }
}
