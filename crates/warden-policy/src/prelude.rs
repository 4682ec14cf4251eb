//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_policy::prelude::*;` to import all essential types.

// Errors
pub use crate::{PolicyError, PolicyResult};

// Breaker
pub use crate::{BreakerCheck, CircuitBreaker, CircuitBreakerState, TripReason};

// Engine
pub use crate::{ApprovalBridge, PolicyEngine};
