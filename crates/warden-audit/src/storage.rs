//! Audit log storage trait and file-backed implementation.

use chrono::Duration;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};
use warden_core::{AuditEntry, Timestamp};

use crate::error::{AuditError, AuditResult};

/// File name of the audit log inside its directory.
pub const AUDIT_FILE_NAME: &str = "audit.jsonl";

/// Storage backend for audit logs.
///
/// Implementations must be thread-safe. Entries are only ever appended;
/// nothing in this contract edits or removes one.
pub trait AuditStorage: Send + Sync {
    /// Durably append an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn append(&self, entry: &AuditEntry) -> AuditResult<()>;

    /// All entries, in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn entries(&self) -> AuditResult<Vec<AuditEntry>>;

    /// Entries whose timestamp lies within `window` of now, in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn recent(&self, window: Duration) -> AuditResult<Vec<AuditEntry>> {
        let now = Timestamp::now();
        let mut entries = self.entries()?;
        entries.retain(|e| e.timestamp.is_within(window, now));
        Ok(entries)
    }

    /// Count total entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn count(&self) -> AuditResult<usize> {
        Ok(self.entries()?.len())
    }
}

/// Line-delimited JSON audit storage.
///
/// Each append takes an exclusive lock on the file, writes one complete
/// line and syncs it to disk before returning, so concurrent writers (in
/// this process or another) never interleave partial records. Lines that
/// fail to parse on read are skipped with a warning.
#[derive(Debug)]
pub struct JsonlAuditStorage {
    path: PathBuf,
}

impl JsonlAuditStorage {
    /// Open (or prepare to create) `dir/audit.jsonl`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> AuditResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| AuditError::io(dir, e))?;
        Ok(Self {
            path: dir.join(AUDIT_FILE_NAME),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> AuditResult<Vec<u8>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AuditError::io(&self.path, e)),
        };

        file.lock_shared().map_err(|e| AuditError::Lock {
            path: self.path.clone(),
            source: e,
        })?;
        let mut buf = Vec::new();
        let read = file.read_to_end(&mut buf);
        let _ = file.unlock();
        read.map_err(|e| AuditError::io(&self.path, e))?;
        Ok(buf)
    }
}

impl AuditStorage for JsonlAuditStorage {
    fn append(&self, entry: &AuditEntry) -> AuditResult<()> {
        let mut line =
            serde_json::to_vec(entry).map_err(|e| AuditError::SerializationError(e.to_string()))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AuditError::io(&self.path, e))?;

        file.lock_exclusive().map_err(|e| AuditError::Lock {
            path: self.path.clone(),
            source: e,
        })?;
        let written = file.write_all(&line).and_then(|()| file.sync_data());
        let _ = file.unlock();
        written.map_err(|e| AuditError::io(&self.path, e))?;

        debug!(entry_id = %entry.id, request_id = %entry.tx_request.id, "Appended audit entry");
        Ok(())
    }

    fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        let raw = self.read_raw()?;
        let mut entries = Vec::new();

        for (index, line) in raw.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index.saturating_add(1),
                    error = %e,
                    "Skipping corrupt audit line"
                ),
            }
        }

        Ok(entries)
    }
}

/// In-memory audit storage.
#[derive(Debug, Default)]
pub struct MemoryAuditStorage {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStorage for MemoryAuditStorage {
    fn append(&self, entry: &AuditEntry) -> AuditResult<()> {
        self.entries
            .write()
            .map_err(|e| AuditError::StorageError(e.to_string()))?
            .push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .map_err(|e| AuditError::StorageError(e.to_string()))?
            .clone())
    }

    fn count(&self) -> AuditResult<usize> {
        Ok(self
            .entries
            .read()
            .map_err(|e| AuditError::StorageError(e.to_string()))?
            .len())
    }
}
