//! Snapshot file codec.
//!
//! A snapshot is a JSON object mapping each key to its entry. Files are
//! written pretty-printed with tab indentation and sorted keys.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::Result;
use crate::store::Entry;

/// Entries keyed by their stored key.
pub type Entries = HashMap<String, Entry>;

// == Encode ==
/// Serializes entries to snapshot bytes.
pub fn encode(entries: &Entries) -> Result<Vec<u8>> {
    let sorted: BTreeMap<&String, &Entry> = entries.iter().collect();

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    sorted.serialize(&mut serializer)?;
    Ok(buf)
}

// == Decode ==
/// Parses snapshot bytes. Empty or whitespace-only input is an empty snapshot.
pub fn decode(bytes: &[u8]) -> Result<Entries> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Entries::new());
    }
    Ok(serde_json::from_slice(bytes)?)
}

// == Blocking I/O ==
/// Reads a snapshot file. A missing file is an empty snapshot.
pub fn read(path: &Path) -> Result<Entries> {
    match std::fs::read(path) {
        Ok(bytes) => decode(&bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
        Err(err) => Err(err.into()),
    }
}

/// Overwrites a snapshot file.
pub fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

// == Async I/O ==
/// Reads a snapshot file without blocking the runtime.
pub async fn read_async(path: &Path) -> Result<Entries> {
    match tokio::fs::read(path).await {
        Ok(bytes) => decode(&bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
        Err(err) => Err(err.into()),
    }
}

/// Overwrites a snapshot file without blocking the runtime.
pub async fn write_async(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
