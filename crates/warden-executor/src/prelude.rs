//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_executor::prelude::*;` to import all essential types.

// Errors
pub use crate::{ExecutorError, ExecutorResult};

// Execution
pub use crate::{
    BREAKER_REFUSAL, ExecutionBackend, ExecutionOutcome, Executor, OutcomeSource, ReadOnlyBackend,
};

// Idempotency
pub use crate::{IdempotencyRecord, IdempotencyStore};
