//! Prelude module - commonly used test helpers.

pub use crate::{MockApprovalBridge, MockBackend, StaticBreaker};
pub use crate::{
    approved_entry, init_test_logging, rejected_entry, test_policy_config, test_request,
    test_secret,
};
