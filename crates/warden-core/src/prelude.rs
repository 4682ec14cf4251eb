//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Data model
pub use crate::{
    AuditEntry, AuditEntryId, DecidedBy, ExecutionResult, PolicyConfig, PolicyKind,
    PolicyVerdict, Severity, Timestamp, TransactionRequest, Violation,
};
