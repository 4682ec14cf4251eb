//! Warden Policy - The decision half of the transaction guard.
//!
//! This crate provides:
//! - [`CircuitBreaker`], the global kill switch, and the one-method
//!   [`BreakerCheck`] capability the engine and executor consume
//! - [`ApprovalBridge`], the one-method human-in-the-loop collaborator
//! - [`PolicyEngine`], which turns a [`TransactionRequest`] into a sealed
//!   [`PolicyVerdict`]
//!
//! # Evaluation
//!
//! 1. A tripped breaker rejects immediately with a single
//!    `circuit-breaker` violation.
//! 2. Allowlist, amount, rate and cooldown checks all run and accumulate.
//! 3. No blocking violation and a value in the HITL band escalates to the
//!    bridge. A missing bridge or a timeout is a denial.
//! 4. The verdict is stamped with `decided_at` and its integrity hash.
//!
//! Policy violations are data on the verdict, never errors.
//!
//! [`TransactionRequest`]: warden_core::TransactionRequest
//! [`PolicyVerdict`]: warden_core::PolicyVerdict
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_core::{PolicyConfig, TransactionRequest};
//! use warden_crypto::VerdictSecret;
//! use warden_policy::{CircuitBreaker, PolicyEngine};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! # rt.block_on(async {
//! let breaker = Arc::new(CircuitBreaker::new(3));
//! let engine = PolicyEngine::new(
//!     PolicyConfig::default(),
//!     breaker.clone(),
//!     VerdictSecret::new("s3cret"),
//! );
//!
//! let request = TransactionRequest::new("swap", "base", 20.0, "agent")
//!     .with_param("tokenIn", "USDC");
//! let verdict = engine.evaluate(&request).await.unwrap();
//! assert!(verdict.approved);
//!
//! breaker.manual_trip();
//! let verdict = engine.evaluate(&request).await.unwrap();
//! assert!(!verdict.approved);
//! # });
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod breaker;
mod bridge;
mod engine;
mod error;

pub use breaker::{BreakerCheck, CircuitBreaker, CircuitBreakerState, TripReason};
pub use bridge::ApprovalBridge;
pub use engine::{DAILY_WINDOW, HOURLY_WINDOW, PolicyEngine};
pub use error::{PolicyError, PolicyResult};
