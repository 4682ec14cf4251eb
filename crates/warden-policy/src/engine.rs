//! The policy engine.

use chrono::Duration as WindowDuration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use warden_audit::AuditLog;
use warden_core::{
    AuditEntry, AuditEntryId, DecidedBy, PolicyConfig, PolicyKind, PolicyVerdict, Timestamp,
    TransactionRequest, Violation,
};
use warden_crypto::{VerdictSecret, seal_verdict};

use crate::breaker::BreakerCheck;
use crate::bridge::ApprovalBridge;
use crate::error::PolicyResult;

/// Trailing window for the hourly rate limit.
pub const HOURLY_WINDOW: WindowDuration = WindowDuration::hours(1);

/// Trailing window for daily limits and the in-memory working set.
pub const DAILY_WINDOW: WindowDuration = WindowDuration::hours(24);

/// Turns requests into sealed verdicts.
///
/// Holds the current [`PolicyConfig`], a rolling 24-hour window of audit
/// entries for windowed accounting, and the secret verdicts are sealed
/// with. Every evaluation is appended to that window and, when an
/// [`AuditLog`] is attached, persisted.
///
/// Checking the window and reserving a slot in it happen under one lock,
/// so concurrent evaluations (including ones parked on a human approval)
/// cannot jointly overrun a limit.
pub struct PolicyEngine {
    config: RwLock<PolicyConfig>,
    breaker: Arc<dyn BreakerCheck>,
    secret: VerdictSecret,
    approval_bridge: Option<Arc<dyn ApprovalBridge>>,
    approval_timeout: Option<Duration>,
    audit_log: Option<AuditLog>,
    window: Mutex<Window>,
}

/// Decided entries, plus provisional entries for evaluations that passed
/// the checks and are still waiting on a decision.
#[derive(Default)]
struct Window {
    entries: Vec<AuditEntry>,
    reserved: Vec<AuditEntry>,
}

/// A provisional approval held in the window. Dropping it releases the
/// slot, so a cancelled evaluation does not leak budget.
struct Reservation<'a> {
    window: &'a Mutex<Window>,
    id: Option<AuditEntryId>,
}

impl Reservation<'_> {
    fn take_id(&mut self) -> Option<AuditEntryId> {
        self.id.take()
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            lock_window(self.window).reserved.retain(|e| e.id != id);
        }
    }
}

impl PolicyEngine {
    /// Create an engine with no approval bridge and no audit log.
    #[must_use]
    pub fn new(
        config: PolicyConfig,
        breaker: Arc<dyn BreakerCheck>,
        secret: VerdictSecret,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            breaker,
            secret,
            approval_bridge: None,
            approval_timeout: None,
            audit_log: None,
            window: Mutex::new(Window::default()),
        }
    }

    /// Attach the human-approval bridge.
    #[must_use]
    pub fn with_approval_bridge(mut self, bridge: Arc<dyn ApprovalBridge>) -> Self {
        self.approval_bridge = Some(bridge);
        self
    }

    /// Bound how long a HITL request may wait. An unanswered request is
    /// denied.
    #[must_use]
    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = Some(timeout);
        self
    }

    /// Persist every verdict to `audit_log`.
    #[must_use]
    pub fn with_audit_log(mut self, audit_log: AuditLog) -> Self {
        self.audit_log = Some(audit_log);
        self
    }

    /// Evaluate a request.
    ///
    /// Always yields a verdict for a well-formed request; broken policies
    /// are reported as violations on it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRequest`](crate::PolicyError::InvalidRequest)
    /// for a structurally invalid request, and
    /// [`PolicyError::Audit`](crate::PolicyError::Audit) if an attached
    /// audit log cannot persist the verdict.
    pub async fn evaluate(&self, request: &TransactionRequest) -> PolicyResult<PolicyVerdict> {
        request.validate()?;

        let (verdict, reservation) = if self.breaker.is_tripped() {
            debug!(request_id = %request.id, "Circuit breaker engaged, rejecting");
            let verdict = self.seal(PolicyVerdict {
                approved: false,
                tx_request: request.clone(),
                violations: vec![Violation::block(
                    PolicyKind::CircuitBreaker,
                    "circuit breaker is tripped; all transactions are halted",
                )],
                requires_hitl: false,
                decided_by: DecidedBy::PolicyEngine,
                decided_at: Timestamp::now(),
                integrity_hash: String::new(),
            });
            (verdict, self.no_reservation())
        } else {
            let config = self.config();
            let (violations, reservation) = self.check_and_reserve(&config, request);
            (self.decide(&config, request, violations).await, reservation)
        };

        self.remember(&verdict, reservation)?;

        info!(
            request_id = %verdict.tx_request.id,
            action = %verdict.tx_request.action,
            value_usd = verdict.tx_request.estimated_value_usd,
            approved = verdict.approved,
            decided_by = %verdict.decided_by,
            requires_hitl = verdict.requires_hitl,
            violations = verdict.violations.len(),
            "Policy verdict"
        );
        Ok(verdict)
    }

    /// Run every independent check against the window, counting pending
    /// reservations as approved. None short-circuits another. A request
    /// with no blocking violation reserves its slot before the lock is
    /// released.
    fn check_and_reserve(
        &self,
        config: &PolicyConfig,
        request: &TransactionRequest,
    ) -> (Vec<Violation>, Reservation<'_>) {
        let now = Timestamp::now();
        let mut window = self.lock_window();
        let mut violations = Vec::new();
        {
            let view: Vec<&AuditEntry> = window.entries.iter().chain(&window.reserved).collect();
            check_allowlist(config, request, &mut violations);
            check_amounts(config, request, &view, now, &mut violations);
            check_rates(config, &view, now, &mut violations);
            check_cooldown(config, &view, now, &mut violations);
        }

        let mut reservation = self.no_reservation();
        if !violations.iter().any(Violation::is_blocking) {
            let provisional = PolicyVerdict {
                approved: true,
                tx_request: request.clone(),
                violations: Vec::new(),
                requires_hitl: false,
                decided_by: DecidedBy::PolicyEngine,
                decided_at: now,
                integrity_hash: String::new(),
            };
            let held = AuditEntry::at(&provisional, now);
            reservation.id = Some(held.id.clone());
            window.reserved.push(held);
        }
        (violations, reservation)
    }

    fn no_reservation(&self) -> Reservation<'_> {
        Reservation {
            window: &self.window,
            id: None,
        }
    }

    async fn decide(
        &self,
        config: &PolicyConfig,
        request: &TransactionRequest,
        mut violations: Vec<Violation>,
    ) -> PolicyVerdict {
        let blocked = violations.iter().any(Violation::is_blocking);

        let (approved, requires_hitl, decided_by) = if blocked {
            (false, false, DecidedBy::PolicyEngine)
        } else if config.requires_hitl(request.estimated_value_usd) {
            let approved = match self.ask_human(request).await {
                Ok(()) => true,
                Err(reason) => {
                    violations.push(Violation::block(PolicyKind::Hitl, reason));
                    false
                },
            };
            (approved, true, DecidedBy::Human)
        } else {
            (true, false, DecidedBy::PolicyEngine)
        };

        self.seal(PolicyVerdict {
            approved,
            tx_request: request.clone(),
            violations,
            requires_hitl,
            decided_by,
            decided_at: Timestamp::now(),
            integrity_hash: String::new(),
        })
    }

    /// Escalate to the bridge. `Err` carries the denial reason.
    async fn ask_human(&self, request: &TransactionRequest) -> Result<(), String> {
        let Some(bridge) = &self.approval_bridge else {
            debug!(request_id = %request.id, "No approval bridge configured, failing closed");
            return Err("human approval required but no approval bridge is configured".to_string());
        };

        info!(
            request_id = %request.id,
            value_usd = request.estimated_value_usd,
            "Escalating to human approval"
        );

        let approved = match self.approval_timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, bridge.request_approval(request)).await {
                    Ok(approved) => approved,
                    Err(_) => {
                        warn!(
                            request_id = %request.id,
                            timeout_secs = timeout.as_secs(),
                            "Human approval timed out, denying"
                        );
                        return Err(format!(
                            "human approval timed out after {}s",
                            timeout.as_secs()
                        ));
                    },
                }
            },
            None => bridge.request_approval(request).await,
        };

        if approved {
            Ok(())
        } else {
            Err("human approver denied the transaction".to_string())
        }
    }

    fn seal(&self, mut verdict: PolicyVerdict) -> PolicyVerdict {
        seal_verdict(&mut verdict, &self.secret);
        verdict
    }

    /// Persist (if attached), then swap the reservation for the final
    /// entry in one step. On a persistence error the reservation is
    /// released by its drop.
    fn remember(
        &self,
        verdict: &PolicyVerdict,
        mut reservation: Reservation<'_>,
    ) -> PolicyResult<()> {
        let entry = AuditEntry::from_verdict(verdict);
        if let Some(audit_log) = &self.audit_log {
            audit_log.record(&entry)?;
        }
        let mut window = self.lock_window();
        if let Some(id) = reservation.take_id() {
            window.reserved.retain(|e| e.id != id);
        }
        window.entries.push(entry);
        prune(&mut window.entries, Timestamp::now());
        Ok(())
    }

    /// Replace the working history, e.g. with `AuditLog::recent(DAILY_WINDOW)`
    /// at startup.
    pub fn load_history(&self, entries: Vec<AuditEntry>) {
        let count = entries.len();
        self.lock_window().entries = entries;
        debug!(entries = count, "Loaded policy history");
    }

    /// Drop working-set entries older than 24 hours. Returns how many were
    /// removed. The on-disk audit log is untouched.
    pub fn prune_history(&self) -> usize {
        prune(&mut self.lock_window().entries, Timestamp::now())
    }

    /// Snapshot of the working history. Pending reservations are not
    /// included.
    #[must_use]
    pub fn history(&self) -> Vec<AuditEntry> {
        self.lock_window().entries.clone()
    }

    /// Number of entries in the working history.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.lock_window().entries.len()
    }

    /// Number of evaluations currently holding a reservation.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock_window().reserved.len()
    }

    /// Replace the configuration wholesale.
    pub fn update_config(&self, config: PolicyConfig) {
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            old_version = current.version,
            new_version = config.version,
            "Policy configuration updated"
        );
        *current = config;
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> PolicyConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_window(&self) -> MutexGuard<'_, Window> {
        lock_window(&self.window)
    }
}

fn lock_window(window: &Mutex<Window>) -> MutexGuard<'_, Window> {
    window.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("config", &self.config())
            .field("history_len", &self.history_len())
            .field("has_approval_bridge", &self.approval_bridge.is_some())
            .field("approval_timeout", &self.approval_timeout)
            .finish_non_exhaustive()
    }
}

fn prune(history: &mut Vec<AuditEntry>, now: Timestamp) -> usize {
    let before = history.len();
    history.retain(|e| e.timestamp.is_within(DAILY_WINDOW, now));
    before.saturating_sub(history.len())
}

fn check_allowlist(
    config: &PolicyConfig,
    request: &TransactionRequest,
    violations: &mut Vec<Violation>,
) {
    if config.is_action_blocked(&request.action) {
        violations.push(Violation::block(
            PolicyKind::Allowlist,
            format!("action '{}' is blocked", request.action),
        ));
    }

    for token in request.referenced_tokens() {
        if !config.is_token_allowed(token) {
            violations.push(Violation::block(
                PolicyKind::Allowlist,
                format!("token {token} is not allowlisted"),
            ));
        }
    }

    for contract in request.referenced_contracts() {
        if !config.is_contract_allowed(contract) {
            violations.push(Violation::block(
                PolicyKind::Allowlist,
                format!("contract {contract} is not allowlisted"),
            ));
        }
    }
}

fn check_amounts(
    config: &PolicyConfig,
    request: &TransactionRequest,
    history: &[&AuditEntry],
    now: Timestamp,
    violations: &mut Vec<Violation>,
) {
    let value = request.estimated_value_usd;
    if value > config.max_per_transaction_usd {
        violations.push(Violation::block(
            PolicyKind::AmountLimit,
            format!(
                "Value ${value:.2} exceeds per-transaction limit ${:.2}",
                config.max_per_transaction_usd
            ),
        ));
    }

    let spent: f64 = approved_within(history, DAILY_WINDOW, now)
        .map(AuditEntry::value_usd)
        .sum();
    #[allow(clippy::arithmetic_side_effects)] // f64 addition saturates to infinity
    let total = spent + value;
    if total > config.max_daily_usd {
        violations.push(Violation::block(
            PolicyKind::AmountLimit,
            format!(
                "Daily total ${total:.2} would exceed daily limit ${:.2}",
                config.max_daily_usd
            ),
        ));
    }
}

fn check_rates(
    config: &PolicyConfig,
    history: &[&AuditEntry],
    now: Timestamp,
    violations: &mut Vec<Violation>,
) {
    let hourly = approved_within(history, HOURLY_WINDOW, now).count();
    if hourly >= config.max_transactions_per_hour as usize {
        violations.push(Violation::block(
            PolicyKind::RateLimit,
            format!(
                "Hourly limit of {} transactions reached",
                config.max_transactions_per_hour
            ),
        ));
    }

    let daily = approved_within(history, DAILY_WINDOW, now).count();
    if daily >= config.max_transactions_per_day as usize {
        violations.push(Violation::block(
            PolicyKind::RateLimit,
            format!(
                "Daily limit of {} transactions reached",
                config.max_transactions_per_day
            ),
        ));
    }
}

/// Consults the most recent entry of any outcome. Skipped entirely when
/// the cooldown is zero.
fn check_cooldown(
    config: &PolicyConfig,
    history: &[&AuditEntry],
    now: Timestamp,
    violations: &mut Vec<Violation>,
) {
    if config.cooldown_seconds == 0 {
        return;
    }

    let cooldown = i64::try_from(config.cooldown_seconds)
        .ok()
        .and_then(WindowDuration::try_seconds)
        .unwrap_or(WindowDuration::MAX);

    let Some(latest) = history.iter().map(|e| e.timestamp).max() else {
        return;
    };

    if latest.is_within(cooldown, now) {
        let remaining = cooldown
            .checked_sub(&latest.age(now))
            .unwrap_or(cooldown)
            .num_seconds();
        violations.push(Violation::block(
            PolicyKind::Cooldown,
            format!(
                "Cooldown of {}s active; {remaining}s remaining",
                config.cooldown_seconds
            ),
        ));
    }
}

fn approved_within<'a>(
    history: &'a [&'a AuditEntry],
    window: WindowDuration,
    now: Timestamp,
) -> impl Iterator<Item = &'a AuditEntry> {
    history
        .iter()
        .copied()
        .filter(move |e| e.is_approved() && e.timestamp.is_within(window, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use warden_core::{Severity, TransactionRequest};
    use warden_crypto::verify_integrity;

    struct FixedBreaker(AtomicBool);

    impl BreakerCheck for FixedBreaker {
        fn is_tripped(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct CountingBridge {
        answer: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl CountingBridge {
        fn new(answer: bool) -> Arc<Self> {
            Arc::new(Self {
                answer,
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(answer: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                answer,
                delay: Some(delay),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ApprovalBridge for CountingBridge {
        async fn request_approval(&self, _request: &TransactionRequest) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer
        }
    }

    fn secret() -> VerdictSecret {
        VerdictSecret::new("engine-test-secret")
    }

    fn engine_with(config: PolicyConfig, tripped: bool) -> PolicyEngine {
        PolicyEngine::new(
            config,
            Arc::new(FixedBreaker(AtomicBool::new(tripped))),
            secret(),
        )
    }

    fn engine() -> PolicyEngine {
        engine_with(PolicyConfig::default(), false)
    }

    fn request(value: f64) -> TransactionRequest {
        TransactionRequest::new("swap", "base", value, "agent").with_param("tokenIn", "USDC")
    }

    fn entry(value: f64, approved: bool, at: Timestamp) -> AuditEntry {
        let verdict = PolicyVerdict {
            approved,
            tx_request: request(value),
            violations: Vec::new(),
            requires_hitl: false,
            decided_by: DecidedBy::PolicyEngine,
            decided_at: at,
            integrity_hash: String::new(),
        };
        AuditEntry::at(&verdict, at)
    }

    #[tokio::test]
    async fn test_low_value_auto_approved() {
        let engine = engine();
        let verdict = engine.evaluate(&request(20.0)).await.unwrap();

        assert!(verdict.approved);
        assert_eq!(verdict.decided_by, DecidedBy::PolicyEngine);
        assert!(verdict.violations.is_empty());
        assert!(!verdict.requires_hitl);
        assert!(!verdict.integrity_hash.is_empty());
        assert!(verify_integrity(&verdict, &secret()));
    }

    #[tokio::test]
    async fn test_tripped_breaker_short_circuits() {
        let config = PolicyConfig {
            blocked_actions: vec!["swap".to_string()],
            cooldown_seconds: 300,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, true);
        engine.load_history(vec![entry(10.0, true, Timestamp::now())]);

        let bad = request(500.0).with_param("tokenOut", "SHIB");
        let verdict = engine.evaluate(&bad).await.unwrap();

        assert!(!verdict.approved);
        assert_eq!(verdict.violations.len(), 1);
        assert_eq!(verdict.violations[0].policy, PolicyKind::CircuitBreaker);
        assert_eq!(verdict.violations[0].severity, Severity::Block);
        assert!(verify_integrity(&verdict, &secret()));
    }

    #[tokio::test]
    async fn test_blocked_action() {
        let config = PolicyConfig {
            blocked_actions: vec!["bridge".to_string()],
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);
        let req = TransactionRequest::new("bridge", "base", 5.0, "agent");
        let verdict = engine.evaluate(&req).await.unwrap();

        assert!(!verdict.approved);
        assert!(verdict.has_violation(PolicyKind::Allowlist));
    }

    #[tokio::test]
    async fn test_unlisted_token_named_in_violation() {
        let engine = engine();
        let verdict = engine
            .evaluate(&request(5.0).with_param("tokenOut", "SHIB"))
            .await
            .unwrap();

        assert!(!verdict.approved);
        let allowlist = verdict.violations_of(PolicyKind::Allowlist);
        assert_eq!(allowlist.len(), 1);
        assert!(allowlist[0].message.contains("SHIB"));
    }

    #[tokio::test]
    async fn test_unlisted_contract_rejected() {
        let config = PolicyConfig {
            allowlisted_contracts: vec!["0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string()],
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);

        let listed = request(5.0).with_param("contract", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        assert!(engine.evaluate(&listed).await.unwrap().approved);

        let unlisted = request(5.0).with_param("router", "0xdeadbeef");
        let verdict = engine.evaluate(&unlisted).await.unwrap();
        assert!(!verdict.approved);
        assert!(verdict.violations_of(PolicyKind::Allowlist)[0]
            .message
            .contains("0xdeadbeef"));
    }

    #[tokio::test]
    async fn test_non_hex_contract_gets_a_verdict() {
        let program = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
        let config = PolicyConfig {
            allowlisted_contracts: vec![program.to_string()],
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);

        let listed = TransactionRequest::new("swap", "solana", 5.0, "agent")
            .with_param("router", program);
        assert!(engine.evaluate(&listed).await.unwrap().approved);

        let unlisted = TransactionRequest::new("swap", "solana", 5.0, "agent")
            .with_param("router", "9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP");
        let verdict = engine.evaluate(&unlisted).await.unwrap();
        assert!(!verdict.approved);
        assert!(verdict.has_violation(PolicyKind::Allowlist));
    }

    #[tokio::test]
    async fn test_per_transaction_limit() {
        let engine = engine();
        let verdict = engine.evaluate(&request(150.0)).await.unwrap();

        assert!(!verdict.approved);
        assert!(verdict.has_violation(PolicyKind::AmountLimit));
        assert!(!verdict.requires_hitl);
    }

    #[tokio::test]
    async fn test_daily_amount_limit() {
        let config = PolicyConfig {
            max_transactions_per_hour: 100,
            max_transactions_per_day: 100,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);
        let at = Timestamp::ago(WindowDuration::hours(2));
        engine.load_history((0..49).map(|_| entry(10.0, true, at)).collect());

        let verdict = engine.evaluate(&request(20.0)).await.unwrap();

        assert!(!verdict.approved);
        let amount = verdict.violations_of(PolicyKind::AmountLimit);
        assert_eq!(amount.len(), 1);
        assert!(amount[0].message.contains("Daily"));
    }

    #[tokio::test]
    async fn test_daily_sum_ignores_rejected_and_stale_entries() {
        let engine = engine();
        let mut history: Vec<AuditEntry> = (0..5)
            .map(|_| entry(90.0, false, Timestamp::ago(WindowDuration::hours(1))))
            .collect();
        history.push(entry(490.0, true, Timestamp::ago(WindowDuration::hours(25))));
        engine.load_history(history);

        let verdict = engine.evaluate(&request(20.0)).await.unwrap();
        assert!(verdict.approved);
    }

    #[tokio::test]
    async fn test_hourly_rate_limit() {
        let engine = engine();
        let at = Timestamp::ago(WindowDuration::minutes(10));
        engine.load_history((0..10).map(|_| entry(1.0, true, at)).collect());

        let verdict = engine.evaluate(&request(1.0)).await.unwrap();
        assert!(!verdict.approved);
        assert!(verdict.has_violation(PolicyKind::RateLimit));
    }

    #[tokio::test]
    async fn test_daily_rate_limit() {
        let config = PolicyConfig {
            max_transactions_per_day: 3,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);
        let at = Timestamp::ago(WindowDuration::hours(5));
        engine.load_history((0..3).map(|_| entry(1.0, true, at)).collect());

        let verdict = engine.evaluate(&request(1.0)).await.unwrap();
        let rate = verdict.violations_of(PolicyKind::RateLimit);
        assert_eq!(rate.len(), 1);
        assert!(rate[0].message.contains("Daily"));
    }

    #[tokio::test]
    async fn test_cooldown_active() {
        let config = PolicyConfig {
            cooldown_seconds: 300,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);
        engine.load_history(vec![entry(
            10.0,
            true,
            Timestamp::ago(WindowDuration::seconds(60)),
        )]);

        let verdict = engine.evaluate(&request(10.0)).await.unwrap();
        assert!(!verdict.approved);
        assert!(verdict.has_violation(PolicyKind::Cooldown));
    }

    #[tokio::test]
    async fn test_cooldown_elapsed() {
        let config = PolicyConfig {
            cooldown_seconds: 60,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);
        engine.load_history(vec![entry(
            10.0,
            true,
            Timestamp::ago(WindowDuration::seconds(120)),
        )]);

        let verdict = engine.evaluate(&request(10.0)).await.unwrap();
        assert!(verdict.approved);
    }

    #[tokio::test]
    async fn test_zero_cooldown_ignores_history() {
        let engine = engine();
        engine.load_history(vec![entry(10.0, true, Timestamp::now())]);
        let verdict = engine.evaluate(&request(10.0)).await.unwrap();
        assert!(verdict.approved);
    }

    #[tokio::test]
    async fn test_checks_accumulate() {
        let config = PolicyConfig {
            blocked_actions: vec!["swap".to_string()],
            cooldown_seconds: 300,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);
        engine.load_history(vec![entry(10.0, true, Timestamp::now())]);

        let verdict = engine.evaluate(&request(10.0)).await.unwrap();
        assert!(!verdict.approved);
        assert!(verdict.violations.len() >= 2);
        assert!(verdict.has_violation(PolicyKind::Allowlist));
        assert!(verdict.has_violation(PolicyKind::Cooldown));
    }

    #[tokio::test]
    async fn test_hitl_approved() {
        let bridge = CountingBridge::new(true);
        let engine = engine().with_approval_bridge(bridge.clone());

        let verdict = engine.evaluate(&request(75.0)).await.unwrap();
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 1);
        assert!(verdict.approved);
        assert!(verdict.requires_hitl);
        assert_eq!(verdict.decided_by, DecidedBy::Human);
        assert!(verdict.violations.is_empty());
    }

    #[tokio::test]
    async fn test_hitl_denied() {
        let bridge = CountingBridge::new(false);
        let engine = engine().with_approval_bridge(bridge.clone());

        let verdict = engine.evaluate(&request(75.0)).await.unwrap();
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 1);
        assert!(!verdict.approved);
        assert_eq!(verdict.decided_by, DecidedBy::Human);
        assert!(verdict.has_violation(PolicyKind::Hitl));
    }

    #[tokio::test]
    async fn test_hitl_without_bridge_fails_closed() {
        let verdict = engine().evaluate(&request(75.0)).await.unwrap();
        assert!(!verdict.approved);
        assert!(verdict.requires_hitl);
        assert_eq!(verdict.decided_by, DecidedBy::Human);
    }

    #[tokio::test]
    async fn test_hitl_not_consulted_when_blocked() {
        let bridge = CountingBridge::new(true);
        let engine = engine().with_approval_bridge(bridge.clone());

        let verdict = engine
            .evaluate(&request(75.0).with_param("tokenOut", "SHIB"))
            .await
            .unwrap();
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
        assert!(!verdict.approved);
        assert!(!verdict.requires_hitl);
        assert_eq!(verdict.decided_by, DecidedBy::PolicyEngine);
    }

    #[tokio::test]
    async fn test_hitl_threshold_is_exclusive() {
        let bridge = CountingBridge::new(false);
        let engine = engine().with_approval_bridge(bridge.clone());

        let verdict = engine.evaluate(&request(50.0)).await.unwrap();
        assert!(verdict.approved);
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hitl_timeout_denies() {
        let bridge = CountingBridge::slow(true, Duration::from_secs(600));
        let engine = engine()
            .with_approval_bridge(bridge.clone())
            .with_approval_timeout(Duration::from_secs(5));

        let verdict = engine.evaluate(&request(75.0)).await.unwrap();
        assert!(!verdict.approved);
        assert!(verdict.violations_of(PolicyKind::Hitl)[0]
            .message
            .contains("timed out"));
    }

    #[tokio::test]
    async fn test_invalid_request_is_an_error() {
        let bad = TransactionRequest::new("", "base", 1.0, "agent");
        assert!(matches!(
            engine().evaluate(&bad).await,
            Err(crate::PolicyError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_evaluations_join_history() {
        let engine = engine();
        assert_eq!(engine.history_len(), 0);
        engine.evaluate(&request(1.0)).await.unwrap();
        engine
            .evaluate(&request(1.0).with_param("token", "SHIB"))
            .await
            .unwrap();
        assert_eq!(engine.history_len(), 2);
    }

    #[tokio::test]
    async fn test_approved_evaluations_count_toward_rate_limit() {
        let config = PolicyConfig {
            max_transactions_per_hour: 2,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false);
        assert!(engine.evaluate(&request(1.0)).await.unwrap().approved);
        assert!(engine.evaluate(&request(1.0)).await.unwrap().approved);
        let third = engine.evaluate(&request(1.0)).await.unwrap();
        assert!(third.has_violation(PolicyKind::RateLimit));
    }

    #[tokio::test]
    async fn test_auto_persist_to_audit_log() {
        let log = AuditLog::in_memory();
        let engine = engine().with_audit_log(log.clone());

        let verdict = engine.evaluate(&request(1.0)).await.unwrap();
        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].verdict, verdict);
    }

    #[tokio::test]
    async fn test_prune_history() {
        let engine = engine();
        engine.load_history(vec![
            entry(1.0, true, Timestamp::ago(WindowDuration::hours(30))),
            entry(1.0, true, Timestamp::ago(WindowDuration::hours(23))),
        ]);
        assert_eq!(engine.prune_history(), 1);
        assert_eq!(engine.history_len(), 1);
    }

    #[tokio::test]
    async fn test_update_config() {
        let engine = engine();
        let stricter = PolicyConfig {
            max_per_transaction_usd: 10.0,
            hitl_threshold_usd: 5.0,
            ..PolicyConfig::default()
        }
        .next_version();
        engine.update_config(stricter);
        assert_eq!(engine.config().version, 2);

        let verdict = engine.evaluate(&request(20.0)).await.unwrap();
        assert!(verdict.has_violation(PolicyKind::AmountLimit));
    }

    #[tokio::test]
    async fn test_each_evaluation_is_a_new_decision() {
        let engine = engine();
        let req = request(1.0);
        let a = engine.evaluate(&req).await.unwrap();
        let b = engine.evaluate(&req).await.unwrap();
        assert_eq!(a.tx_request, b.tx_request);
        assert!(b.decided_at >= a.decided_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_hitl_evaluations_respect_daily_limit() {
        let bridge = CountingBridge::slow(true, Duration::from_millis(50));
        let engine = Arc::new(engine().with_approval_bridge(bridge));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.evaluate(&request(75.0)).await.unwrap() })
            })
            .collect();
        let mut verdicts = Vec::new();
        for task in tasks {
            verdicts.push(task.await.unwrap());
        }
        let approved = verdicts.iter().filter(|v| v.approved).count();

        // 6 x $75 fits under $500; a seventh would not.
        assert_eq!(approved, 6);
        assert_eq!(engine.pending_len(), 0);
        let spent: f64 = engine
            .history()
            .iter()
            .filter(|e| e.is_approved())
            .map(AuditEntry::value_usd)
            .sum();
        assert!(spent <= 500.0);
    }

    #[tokio::test]
    async fn test_denied_hitl_releases_reservation() {
        let config = PolicyConfig {
            max_daily_usd: 100.0,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false).with_approval_bridge(CountingBridge::new(false));

        assert!(!engine.evaluate(&request(75.0)).await.unwrap().approved);
        assert_eq!(engine.pending_len(), 0);
        assert!(engine.evaluate(&request(40.0)).await.unwrap().approved);
    }

    #[tokio::test]
    async fn test_cancelled_evaluation_releases_reservation() {
        let config = PolicyConfig {
            max_daily_usd: 100.0,
            ..PolicyConfig::default()
        };
        let engine = engine_with(config, false)
            .with_approval_bridge(CountingBridge::slow(true, Duration::from_secs(5)));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), engine.evaluate(&request(75.0))).await;
        assert!(abandoned.is_err());
        assert_eq!(engine.pending_len(), 0);
        assert_eq!(engine.history_len(), 0);

        assert!(engine.evaluate(&request(40.0)).await.unwrap().approved);
    }

    #[tokio::test]
    async fn test_pending_reservation_counts_against_limits() {
        let config = PolicyConfig {
            max_daily_usd: 100.0,
            ..PolicyConfig::default()
        };
        let engine = Arc::new(
            engine_with(config, false)
                .with_approval_bridge(CountingBridge::slow(true, Duration::from_millis(200))),
        );

        let parked = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.evaluate(&request(75.0)).await.unwrap() })
        };
        while engine.pending_len() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let blocked = engine.evaluate(&request(40.0)).await.unwrap();
        assert!(blocked.has_violation(PolicyKind::AmountLimit));
        assert!(parked.await.unwrap().approved);
    }
}
