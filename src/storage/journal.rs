//! Append-only recovery log.
//!
//! Every mutation of the durable state is written here as one text line and
//! synced before it is applied in memory:
//!
//! ```text
//! + h <u64 fingerprint>
//! + u <source url>
//! + i <i64 recipient id>
//! ```
//!
//! A record counts only once its trailing newline is on disk. On replay a final
//! line without a newline is the remains of a crash mid-write and is dropped;
//! malformed lines and unknown record kinds are skipped with a warning.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use super::fsync::fsync_parent;
use crate::domain::Fingerprint;

/// One journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    MarkSeen(Fingerprint),
    AddSource(String),
    AddRecipient(i64),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRecordError {
    #[error("empty line")]
    Empty,
    #[error("not an addition record")]
    NotAnAddition,
    #[error("unknown record kind {0:?}")]
    UnknownKind(String),
    #[error("bad value {value:?} for record kind {kind:?}")]
    BadValue { kind: String, value: String },
}

impl Record {
    pub fn parse(line: &str) -> Result<Self, ParseRecordError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Err(ParseRecordError::Empty);
        }

        let body = line
            .strip_prefix("+ ")
            .ok_or(ParseRecordError::NotAnAddition)?;
        let (kind, value) = body.split_once(' ').unwrap_or((body, ""));

        let bad_value = || ParseRecordError::BadValue {
            kind: kind.to_string(),
            value: value.to_string(),
        };

        match kind {
            "h" => value.parse().map(Record::MarkSeen).map_err(|_| bad_value()),
            "u" if !value.is_empty() => Ok(Record::AddSource(value.to_string())),
            "u" => Err(bad_value()),
            "i" => value.parse().map(Record::AddRecipient).map_err(|_| bad_value()),
            other => Err(ParseRecordError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::MarkSeen(hash) => write!(f, "+ h {}", hash),
            Record::AddSource(url) => write!(f, "+ u {}", url),
            Record::AddRecipient(id) => write!(f, "+ i {}", id),
        }
    }
}

/// Writer for a fresh journal file.
pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Create an empty journal at `path`, truncating any previous contents.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        file.sync_all()?;
        fsync_parent(&path)?;

        Ok(Self { file, path })
    }

    /// Write one record and sync it to disk.
    ///
    /// When this returns `Ok` the record survives a crash.
    pub fn append(&mut self, record: &Record) -> io::Result<()> {
        let line = format!("{}\n", record);
        self.file.write_all(line.as_bytes())?;
        self.file.sync_data()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every committed record of the journal at `path`, in file order.
    ///
    /// A missing file yields no records.
    pub fn replay(path: impl AsRef<Path>) -> io::Result<Vec<Record>> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(parse_committed(&bytes, path))
    }
}

fn parse_committed(bytes: &[u8], path: &Path) -> Vec<Record> {
    let mut records = Vec::new();
    let mut lines = bytes.split_inclusive(|b| *b == b'\n').enumerate().peekable();

    while let Some((number, raw)) = lines.next() {
        if !raw.ends_with(b"\n") {
            // Only the last chunk can lack a newline
            debug_assert!(lines.peek().is_none());
            warn!(
                path = %path.display(),
                line = number + 1,
                "Ignoring truncated final journal line"
            );
            break;
        }

        let Ok(text) = std::str::from_utf8(raw) else {
            warn!(path = %path.display(), line = number + 1, "Skipping non UTF-8 journal line");
            continue;
        };

        match Record::parse(text) {
            Ok(record) => records.push(record),
            Err(ParseRecordError::Empty) => {}
            Err(e) => warn!(
                path = %path.display(),
                line = number + 1,
                error = %e,
                "Skipping journal line"
            ),
        }
    }

    records
}
