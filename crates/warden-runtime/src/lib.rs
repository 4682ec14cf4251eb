//! Warden Runtime - the transaction guard as one object.
//!
//! [`Guard`] wires the policy engine, circuit breaker, audit log and
//! idempotent executor along the request path:
//!
//! ```text
//! request ─► validate ─► PolicyEngine::evaluate ─► AuditLog
//!                              │ approved
//!                              ▼
//!                        Executor::execute ─► ExecutionBackend
//!                              │ fresh outcome
//!                              ▼
//!                        CircuitBreaker (success / failure streak)
//! ```
//!
//! Build one with [`GuardBuilder`] from a [`warden_config::Config`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;

mod error;
mod guard;

pub use error::{GuardError, GuardResult};
pub use guard::{Guard, GuardBuilder, Submission};
