//! Shared durable state with its recovery log.
//!
//! [`StateStore`] is the only way to touch the durable state. A single mutex
//! guards both the in-memory state and the journal writer, so every mutation
//! is journaled, synced and applied as one step, and journal appends from the
//! poller and the command handlers never interleave.
//!
//! # Startup
//!
//! 1. Load `db.json` (missing or unreadable: empty state)
//! 2. Replay `evolution.txt` on top of it
//! 3. Write a fresh `db.json` and truncate `evolution.txt`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::info;

use super::journal::{Journal, Record};
use super::snapshot;
use super::state::DurableState;
use crate::domain::Fingerprint;
use crate::errors::{RelayError, RelayResult};

pub const SNAPSHOT_FILE: &str = "db.json";
pub const JOURNAL_FILE: &str = "evolution.txt";

/// Locations of the two state files inside a state directory.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub snapshot: PathBuf,
    pub journal: PathBuf,
}

impl StatePaths {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            snapshot: dir.join(SNAPSHOT_FILE),
            journal: dir.join(JOURNAL_FILE),
        }
    }
}

struct Inner {
    state: DurableState,
    journal: Journal,
}

pub struct StateStore {
    inner: Mutex<Inner>,
}

impl StateStore {
    /// Recover the state in `dir`, compact it and start a new journal.
    ///
    /// Any I/O failure here is returned; the caller must not run without
    /// persistable state.
    pub fn open(dir: impl AsRef<Path>) -> RelayResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let paths = StatePaths::new(dir);

        let state = Self::recover(dir)?;
        snapshot::save_atomic(&paths.snapshot, &state)?;
        let journal = Journal::create(&paths.journal)?;

        info!(
            dir = %dir.display(),
            sources = state.sources().len(),
            recipients = state.recipients().len(),
            seen = state.seen().len(),
            "State recovered and compacted"
        );

        Ok(Self {
            inner: Mutex::new(Inner { state, journal }),
        })
    }

    /// Snapshot plus journal replay, without writing anything.
    pub fn recover(dir: impl AsRef<Path>) -> RelayResult<DurableState> {
        let paths = StatePaths::new(dir);

        let mut state = snapshot::load(&paths.snapshot)?;
        let records = Journal::replay(&paths.journal)?;
        state.apply_all(&records);

        Ok(state)
    }

    fn lock(&self) -> RelayResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| RelayError::LockPoisoned)
    }

    /// Journal `record`, then apply it. Nothing is applied if the write fails.
    fn commit(inner: &mut Inner, record: Record) -> RelayResult<()> {
        inner.journal.append(&record)?;
        inner.state.apply(&record);
        Ok(())
    }

    pub fn is_new(&self, fingerprint: Fingerprint) -> RelayResult<bool> {
        Ok(self.lock()?.state.is_new(fingerprint))
    }

    /// Durably mark `fingerprint` as seen.
    ///
    /// Returns `true` if this call claimed it and `false` if it was already
    /// seen, so concurrent ticks racing on the same item deliver it once.
    pub fn mark_seen(&self, fingerprint: Fingerprint) -> RelayResult<bool> {
        let mut inner = self.lock()?;
        if !inner.state.is_new(fingerprint) {
            return Ok(false);
        }

        Self::commit(&mut inner, Record::MarkSeen(fingerprint))?;
        Ok(true)
    }

    /// Durably subscribe to `url` and return its index.
    pub fn add_source(&self, url: &str) -> RelayResult<usize> {
        let mut inner = self.lock()?;
        Self::commit(&mut inner, Record::AddSource(url.to_string()))?;
        Ok(inner.state.sources().len() - 1)
    }

    /// Durably register `id`. Returns `false` if it was already registered.
    pub fn add_recipient(&self, id: i64) -> RelayResult<bool> {
        let mut inner = self.lock()?;
        if inner.state.recipients().contains(&id) {
            return Ok(false);
        }

        Self::commit(&mut inner, Record::AddRecipient(id))?;
        Ok(true)
    }

    /// Current sources with their indices.
    pub fn sources(&self) -> RelayResult<Vec<String>> {
        Ok(self.lock()?.state.sources().to_vec())
    }

    pub fn recipients(&self) -> RelayResult<Vec<i64>> {
        Ok(self.lock()?.state.recipients().to_vec())
    }

    pub fn seen_count(&self) -> RelayResult<usize> {
        Ok(self.lock()?.state.seen().len())
    }

    /// Encoded copy of the current state, in the snapshot format.
    pub fn snapshot(&self) -> RelayResult<Vec<u8>> {
        snapshot::encode(&self.lock()?.state)
    }

    pub fn state(&self) -> RelayResult<DurableState> {
        Ok(self.lock()?.state.clone())
    }
}
