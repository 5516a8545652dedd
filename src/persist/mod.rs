//! Persistence Module
//!
//! Synchronizes the store with a JSON snapshot file under a merge policy.
//!
//! # Policies
//! - `MemoryPrior`: disk snapshot overlaid by memory, memory wins collisions
//! - `DiskPrior`: memory overlaid by the disk snapshot, disk wins collisions
//! - `None`: no reconciliation, the source side is copied verbatim
//!
//! Flushing never changes memory and loading never changes the file. A
//! missing file reads as an empty snapshot.

pub mod snapshot;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::store::Store;

pub use snapshot::Entries;

// == Merge Policy ==
/// How memory and the snapshot file are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergePolicy {
    /// Memory wins on key collisions
    #[default]
    MemoryPrior,
    /// Disk wins on key collisions
    #[serde(alias = "FILE_PRIOR")]
    DiskPrior,
    /// Skip reconciliation
    None,
}

impl MergePolicy {
    /// Returns true if both sides are combined.
    pub fn is_merging(self) -> bool {
        !matches!(self, MergePolicy::None)
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergePolicy::MemoryPrior => "MEMORY_PRIOR",
            MergePolicy::DiskPrior => "DISK_PRIOR",
            MergePolicy::None => "NONE",
        };
        f.write_str(name)
    }
}

impl FromStr for MergePolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MEMORY_PRIOR" => Ok(MergePolicy::MemoryPrior),
            "DISK_PRIOR" | "FILE_PRIOR" => Ok(MergePolicy::DiskPrior),
            "NONE" | "" => Ok(MergePolicy::None),
            other => Err(StoreError::Configuration(format!(
                "unknown merge policy '{}'",
                other
            ))),
        }
    }
}

// == Merge ==
/// Combines memory and disk entries under `policy`.
///
/// `MergePolicy::None` returns the memory side untouched.
pub fn merge(memory: &Entries, disk: Entries, policy: MergePolicy) -> Entries {
    match policy {
        MergePolicy::MemoryPrior => {
            let mut merged = disk;
            merged.extend(memory.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        }
        MergePolicy::DiskPrior => {
            let mut merged = memory.clone();
            merged.extend(disk);
            merged
        }
        MergePolicy::None => memory.clone(),
    }
}

/// The snapshot bytes a flush writes.
pub(crate) fn flush_payload(memory: &Entries, disk: Entries, policy: MergePolicy) -> Result<Vec<u8>> {
    if policy.is_merging() {
        snapshot::encode(&merge(memory, disk, policy))
    } else {
        snapshot::encode(memory)
    }
}

/// The entries memory holds after a load.
pub(crate) fn load_result(memory: &Entries, disk: Entries, policy: MergePolicy) -> Entries {
    if policy.is_merging() {
        merge(memory, disk, policy)
    } else {
        disk
    }
}

impl Store {
    // == Flush ==
    /// Writes the store to its snapshot file.
    ///
    /// With a merging policy the file's current contents are read and
    /// combined with memory first. Memory is not modified.
    pub fn flush(&self, policy: MergePolicy) -> Result<()> {
        let path = &self.config().disk_file;
        let disk = if policy.is_merging() {
            snapshot::read(path)?
        } else {
            Entries::new()
        };

        let payload = flush_payload(self.entries(), disk, policy)?;
        snapshot::write(path, &payload)?;
        info!(path = %path.display(), %policy, entries = self.len(), "flushed store");
        Ok(())
    }

    /// Non-blocking variant of [`Store::flush`].
    pub async fn flush_async(&self, policy: MergePolicy) -> Result<()> {
        let path = &self.config().disk_file;
        let disk = if policy.is_merging() {
            snapshot::read_async(path).await?
        } else {
            Entries::new()
        };

        let payload = flush_payload(self.entries(), disk, policy)?;
        snapshot::write_async(path, &payload).await?;
        info!(path = %path.display(), %policy, entries = self.len(), "flushed store");
        Ok(())
    }

    // == Load ==
    /// Replaces memory with the snapshot file, merged under `policy`.
    ///
    /// The file is not modified. Returns the number of entries now held.
    pub fn load(&mut self, policy: MergePolicy) -> Result<usize> {
        let disk = snapshot::read(&self.config().disk_file)?;
        Ok(self.apply_loaded(disk, policy))
    }

    /// Non-blocking variant of [`Store::load`].
    pub async fn load_async(&mut self, policy: MergePolicy) -> Result<usize> {
        let disk = snapshot::read_async(&self.config().disk_file).await?;
        Ok(self.apply_loaded(disk, policy))
    }

    pub(crate) fn apply_loaded(&mut self, disk: Entries, policy: MergePolicy) -> usize {
        let loaded = load_result(self.entries(), disk, policy);
        self.replace_entries(loaded);
        info!(path = %self.config().disk_file.display(), %policy, entries = self.len(), "loaded store");
        self.len()
    }
}
