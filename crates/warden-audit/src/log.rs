//! Audit log - main interface for recording verdicts.

use chrono::Duration;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use warden_core::{AuditEntry, PolicyVerdict};

use crate::error::AuditResult;
use crate::storage::{AuditStorage, JsonlAuditStorage, MemoryAuditStorage};

/// Append-only log of verdicts.
///
/// Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct AuditLog {
    storage: Arc<dyn AuditStorage>,
}

impl AuditLog {
    /// Create an audit log over a custom storage backend.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn AuditStorage>) -> Self {
        Self { storage }
    }

    /// Open a file-backed log in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> AuditResult<Self> {
        let storage = JsonlAuditStorage::open(dir)?;
        Ok(Self::with_storage(Arc::new(storage)))
    }

    /// Create an in-memory audit log (for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryAuditStorage::new()))
    }

    /// Record a verdict, stamped now. Returns the stored entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    pub fn append(&self, verdict: &PolicyVerdict) -> AuditResult<AuditEntry> {
        let entry = AuditEntry::from_verdict(verdict);
        self.record(&entry)?;
        Ok(entry)
    }

    /// Persist a pre-built entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    pub fn record(&self, entry: &AuditEntry) -> AuditResult<()> {
        debug!(
            entry_id = %entry.id,
            request_id = %entry.tx_request.id,
            approved = entry.verdict.approved,
            "Recording audit entry"
        );
        self.storage.append(entry)
    }

    /// Entries recorded within `window` of now, oldest first. Used to seed
    /// the policy engine's working set after a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn recent(&self, window: Duration) -> AuditResult<Vec<AuditEntry>> {
        self.storage.recent(window)
    }

    /// Every entry ever recorded, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        self.storage.entries()
    }

    /// Entries for one request id, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn entries_for_request(&self, request_id: &str) -> AuditResult<Vec<AuditEntry>> {
        let mut entries = self.storage.entries()?;
        entries.retain(|e| e.tx_request.id == request_id);
        Ok(entries)
    }

    /// Count total entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn count(&self) -> AuditResult<usize> {
        self.storage.count()
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}
