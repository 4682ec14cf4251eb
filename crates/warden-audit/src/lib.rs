//! Warden Audit - Durable, append-only record of every verdict.
//!
//! This crate provides:
//! - The [`AuditStorage`] trait, the minimal contract a backend must meet
//! - [`JsonlAuditStorage`], a line-delimited JSON file guarded by an
//!   exclusive file lock and flushed to disk on every append
//! - [`MemoryAuditStorage`] for tests and ephemeral runs
//! - [`AuditLog`], the high-level handle used by the policy engine
//!
//! The on-disk log keeps every entry forever. Pruning only ever happens in
//! the policy engine's in-memory working set.
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use warden_audit::AuditLog;
//! use warden_core::{DecidedBy, PolicyVerdict, Timestamp, TransactionRequest};
//!
//! let log = AuditLog::in_memory();
//! let verdict = PolicyVerdict {
//!     approved: true,
//!     tx_request: TransactionRequest::new("swap", "base", 10.0, "agent"),
//!     violations: Vec::new(),
//!     requires_hitl: false,
//!     decided_by: DecidedBy::PolicyEngine,
//!     decided_at: Timestamp::now(),
//!     integrity_hash: String::new(),
//! };
//!
//! log.append(&verdict).unwrap();
//! assert_eq!(log.count().unwrap(), 1);
//! assert_eq!(log.recent(Duration::hours(24)).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod log;
mod storage;

pub use error::{AuditError, AuditResult};
pub use log::AuditLog;
pub use storage::{AUDIT_FILE_NAME, AuditStorage, JsonlAuditStorage, MemoryAuditStorage};
