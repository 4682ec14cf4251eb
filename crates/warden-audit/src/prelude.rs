//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Log
pub use crate::AuditLog;

// Storage
pub use crate::{AuditStorage, JsonlAuditStorage, MemoryAuditStorage};
