//! Warden Executor - At-most-once execution of approved verdicts.
//!
//! This crate provides:
//! - [`IdempotencyStore`], a durable key → [`ExecutionResult`] map backed by
//!   an append-only JSONL file
//! - [`ExecutionBackend`], the opaque dispatch collaborator, and
//!   [`ReadOnlyBackend`], the refuse-everything default
//! - [`Executor`], which checks a verdict, then replays or dispatches it
//!
//! # Execution order
//!
//! 1. **Security check**, always first: the verdict must be approved and its
//!    integrity hash must match. Failures are errors, never results.
//! 2. **Idempotency check**: a decision already executed returns its cached
//!    result without dispatching.
//! 3. **Dispatch**, under a per-key lock, then record the result.
//!
//! [`ExecutionResult`]: warden_core::ExecutionResult

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod backend;
mod error;
mod executor;
mod store;

pub use backend::{ExecutionBackend, READ_ONLY_ERROR, ReadOnlyBackend};
pub use error::{ExecutorError, ExecutorResult};
pub use executor::{BREAKER_REFUSAL, ExecutionOutcome, Executor, OutcomeSource};
pub use store::{IdempotencyRecord, IdempotencyStore};
