//! Warden Core - Foundation types for the warden transaction guard.
//!
//! This crate provides:
//! - [`TransactionRequest`], the immutable action proposal from an agent
//! - [`PolicyConfig`], the versioned, replaceable policy limits
//! - [`PolicyVerdict`] and [`Violation`], the decision record
//! - [`AuditEntry`], the append-only record of a decision
//! - [`ExecutionResult`], the outcome of a real dispatch
//!
//! Every other warden crate builds on these types. This crate has no
//! dependencies on other internal crates.
//!
//! # Example
//!
//! ```
//! use warden_core::TransactionRequest;
//!
//! let request = TransactionRequest::new("swap", "base", 25.0, "agent-7")
//!     .with_param("tokenIn", "USDC")
//!     .with_param("tokenOut", "ETH")
//!     .with_reason("rebalance treasury");
//!
//! assert!(request.validate().is_ok());
//! assert_eq!(request.referenced_tokens(), vec!["USDC", "ETH"]);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod entry;
pub mod error;
pub mod execution;
pub mod policy;
pub mod request;
pub mod types;
pub mod verdict;

pub use entry::{AuditEntry, AuditEntryId};
pub use error::{CoreError, CoreResult};
pub use execution::ExecutionResult;
pub use policy::PolicyConfig;
pub use request::TransactionRequest;
pub use types::Timestamp;
pub use verdict::{DecidedBy, PolicyKind, PolicyVerdict, Severity, Violation};
