//! Durable idempotency store.
//!
//! One JSON record per line: `{"key", "result", "createdAt"}`. Records are
//! only appended, never rewritten or compacted.

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, error, warn};
use warden_core::{ExecutionResult, Timestamp};

use crate::error::{ExecutorError, ExecutorResult};

/// One line of the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyRecord {
    /// The idempotency key.
    pub key: String,
    /// The recorded outcome.
    pub result: ExecutionResult,
    /// When the record was written.
    pub created_at: Timestamp,
}

/// Maps idempotency keys to previously observed execution results.
///
/// File-backed stores survive restarts: reopening the same file reproduces
/// the same mapping. If a key appears on more than one line, the first
/// one wins.
#[derive(Debug)]
pub struct IdempotencyStore {
    path: Option<PathBuf>,
    records: RwLock<HashMap<String, ExecutionResult>>,
}

impl IdempotencyStore {
    /// Create an empty store backed by `path`. Call [`load`](Self::load) to
    /// read existing records.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store backed by `path` and load it.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        store.load();
        store
    }

    /// Create a store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// The backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read all records from the backing file into memory. Returns the
    /// number of keys known afterwards.
    ///
    /// Never fails: a missing file is an empty store, an unreadable file is
    /// logged and treated as empty, and corrupt lines are skipped.
    pub fn load(&self) -> usize {
        let Some(path) = &self.path else {
            return self.size();
        };

        let raw = match read_locked(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Idempotency store unreadable, starting empty"
                );
                Vec::new()
            },
        };

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        for (index, line) in raw.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<IdempotencyRecord>(line) {
                Ok(record) => {
                    records.entry(record.key).or_insert(record.result);
                },
                Err(e) => warn!(
                    path = %path.display(),
                    line = index.saturating_add(1),
                    error = %e,
                    "Skipping corrupt idempotency record"
                ),
            }
        }

        debug!(path = %path.display(), keys = records.len(), "Loaded idempotency store");
        records.len()
    }

    /// Make a result visible to [`get`](Self::get), then durably append it.
    ///
    /// The in-memory entry is kept even when the append fails, so a result
    /// the backend already produced is never dispatched again by this
    /// process.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written and synced. The
    /// result will not survive a restart in that case.
    pub fn record(&self, key: &str, result: &ExecutionResult) -> ExecutorResult<()> {
        {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            match records.entry(key.to_string()) {
                Entry::Occupied(_) => {
                    warn!(idempotency_key = %key, "Key recorded twice, keeping first result");
                },
                Entry::Vacant(slot) => {
                    slot.insert(result.clone());
                },
            }
        }

        let Some(path) = &self.path else {
            return Ok(());
        };
        let record = IdempotencyRecord {
            key: key.to_string(),
            result: result.clone(),
            created_at: Timestamp::now(),
        };
        append_line(path, &record).inspect_err(|e| {
            error!(
                idempotency_key = %key,
                error = %e,
                "Idempotency record not persisted, result held in memory only"
            );
        })
    }

    /// The cached result for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ExecutionResult> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Whether `key` has a cached result.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of known keys.
    #[must_use]
    pub fn size(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn read_locked(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.lock_shared()?;
    let mut buf = Vec::new();
    let read = file.read_to_end(&mut buf);
    let _ = file.unlock();
    read.map(|_| buf)
}

fn append_line(path: &Path, record: &IdempotencyRecord) -> ExecutorResult<()> {
    let store_err = |source| ExecutorError::StoreIo {
        path: path.to_path_buf(),
        source,
    };

    let mut line =
        serde_json::to_vec(record).map_err(|e| ExecutorError::Serialization(e.to_string()))?;
    line.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(store_err)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(store_err)?;
    file.lock_exclusive().map_err(store_err)?;
    let written = file.write_all(&line).and_then(|()| file.sync_data());
    let _ = file.unlock();
    written.map_err(store_err)
}
