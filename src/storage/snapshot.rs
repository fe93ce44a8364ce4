//! Compacted copy of the whole durable state.
//!
//! Stored as one JSON object whose field names match the `db.json` files of
//! earlier deployments. Written with write-to-temp-then-rename so a crash
//! leaves either the old or the new snapshot, never a torn one.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::fsync::{fsync_file, fsync_parent};
use super::state::DurableState;
use crate::domain::Fingerprint;
use crate::errors::RelayResult;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SnapshotRecord {
    #[serde(default)]
    hashes: Option<Vec<Fingerprint>>,
    #[serde(default)]
    urls: Option<Vec<String>>,
    #[serde(default)]
    ids: Option<Vec<i64>>,
}

/// Serialize the full state. Fingerprints are sorted so equal states encode identically.
pub fn encode(state: &DurableState) -> RelayResult<Vec<u8>> {
    let mut hashes: Vec<Fingerprint> = state.seen().iter().copied().collect();
    hashes.sort_unstable();

    let record = SnapshotRecord {
        hashes: Some(hashes),
        urls: Some(state.sources().to_vec()),
        ids: Some(state.recipients().to_vec()),
    };
    Ok(serde_json::to_vec(&record)?)
}

/// Inverse of [`encode`]. Missing or `null` lists decode as empty.
pub fn decode(bytes: &[u8]) -> RelayResult<DurableState> {
    let record: SnapshotRecord = serde_json::from_slice(bytes)?;
    Ok(DurableState::new(
        record.hashes.unwrap_or_default(),
        record.urls.unwrap_or_default(),
        record.ids.unwrap_or_default(),
    ))
}

/// Load the snapshot at `path`.
///
/// A missing snapshot is an empty state. So is an undecodable one: losing it
/// only risks re-delivering old items, which beats refusing to start.
pub fn load(path: &Path) -> io::Result<DurableState> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DurableState::default()),
        Err(e) => return Err(e),
    };

    match decode(&bytes) {
        Ok(state) => Ok(state),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Snapshot is unreadable, starting from empty state");
            Ok(DurableState::default())
        }
    }
}

/// Write the snapshot atomically: temp file, fsync, rename, fsync directory.
pub fn save_atomic(path: &Path, state: &DurableState) -> RelayResult<()> {
    let bytes = encode(state)?;
    let tmp_path = path.with_extension("json.tmp");

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&bytes)?;
        fsync_file(&file)?;
    }

    fs::rename(&tmp_path, path)?;
    fsync_parent(path)?;
    Ok(())
}
