//! Human-in-the-loop approval.

use async_trait::async_trait;
use warden_core::TransactionRequest;

/// Asks a human whether a borderline request may proceed.
///
/// Invoked only for requests in the HITL band that passed every other
/// check. Frontends (CLI prompt, chat bot, web UI) implement this.
///
/// # Example
///
/// ```
/// use warden_core::TransactionRequest;
/// use warden_policy::ApprovalBridge;
///
/// struct DenyAll;
///
/// #[async_trait::async_trait]
/// impl ApprovalBridge for DenyAll {
///     async fn request_approval(&self, _request: &TransactionRequest) -> bool {
///         false
///     }
/// }
/// ```
#[async_trait]
pub trait ApprovalBridge: Send + Sync {
    /// Present the request and wait for a decision. `true` approves.
    async fn request_approval(&self, request: &TransactionRequest) -> bool;
}
