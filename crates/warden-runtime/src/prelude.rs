//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_runtime::prelude::*;` to import all essential types.

pub use crate::{Guard, GuardBuilder, GuardError, GuardResult, Submission};

pub use warden_core::{ExecutionResult, PolicyConfig, PolicyVerdict, TransactionRequest};
