//! Warden Test - shared test utilities for the warden crates.
//!
//! Mocks for the three seams the guard talks through (approval bridge,
//! execution backend, breaker check) plus fixtures for common values.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! warden-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_test::{MockBackend, test_request};
//!
//! #[tokio::test]
//! async fn test_dispatch_counted() {
//!     let backend = Arc::new(MockBackend::succeeding());
//!     // ... wire into an Executor ...
//!     assert_eq!(backend.dispatch_count(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod logging;
pub mod mocks;

pub use fixtures::*;
pub use logging::*;
pub use mocks::*;
