//! Regression tests for the execution safety guarantees.
//!
//! - Rejected or altered verdicts never reach the backend
//! - Verdicts sealed under another secret are refused
//! - A planted idempotency record cannot launder an unapproved verdict
//! - Concurrent execution of one verdict dispatches at most once
//! - A tripped breaker refuses new dispatches without poisoning the cache
//! - Concurrent submissions cannot jointly exceed the daily limit
//! - A result that could not be persisted is still not dispatched twice

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use warden_config::StoragePaths;
use warden_core::{ExecutionResult, Timestamp};
use warden_crypto::{VerdictSecret, generate_idempotency_key, seal_verdict, verify_integrity};
use warden_executor::{BREAKER_REFUSAL, ExecutorError, IdempotencyStore};
use warden_runtime::{GuardBuilder, GuardError};
use warden_test::{MockApprovalBridge, MockBackend, test_policy_config, test_request, test_secret};

use common::{config_with, disk_guard, memory_guard};

fn is_unapproved(err: &GuardError) -> bool {
    matches!(err, GuardError::Executor(ExecutorError::UnapprovedVerdict { .. }))
}

fn is_integrity_mismatch(err: &GuardError) -> bool {
    matches!(err, GuardError::Executor(ExecutorError::IntegrityMismatch { .. }))
}

#[tokio::test]
async fn test_rejected_verdict_refused() {
    let backend = Arc::new(MockBackend::succeeding());
    let guard = memory_guard(config_with(&test_policy_config()), Arc::clone(&backend));

    let rejected = guard.submit(&test_request(500.0)).await.unwrap().verdict;
    let err = guard.execute(&rejected).await.unwrap_err();
    assert!(is_unapproved(&err));
    assert!(err.is_security_error());
    assert_eq!(backend.dispatch_count(), 0);
}

#[tokio::test]
async fn test_flipped_approval_detected() {
    let backend = Arc::new(MockBackend::succeeding());
    let guard = memory_guard(config_with(&test_policy_config()), Arc::clone(&backend));

    let mut forged = guard.submit(&test_request(500.0)).await.unwrap().verdict;
    forged.approved = true;
    forged.violations.clear();

    let err = guard.execute(&forged).await.unwrap_err();
    assert!(is_integrity_mismatch(&err));
    assert_eq!(backend.dispatch_count(), 0);
}

#[tokio::test]
async fn test_altered_request_id_or_timestamp_detected() {
    let backend = Arc::new(MockBackend::succeeding());
    let guard = memory_guard(config_with(&test_policy_config()), Arc::clone(&backend));
    let verdict = guard.submit(&test_request(5.0)).await.unwrap().verdict;
    let dispatched = backend.dispatch_count();

    let mut renamed = verdict.clone();
    renamed.tx_request.id = "tx-replay".to_string();
    assert!(is_integrity_mismatch(&guard.execute(&renamed).await.unwrap_err()));

    let mut redated = verdict;
    redated.decided_at = Timestamp::now();
    assert!(is_integrity_mismatch(&guard.execute(&redated).await.unwrap_err()));

    assert_eq!(backend.dispatch_count(), dispatched);
}

#[tokio::test]
async fn test_verdict_sealed_with_other_secret_refused() {
    let backend = Arc::new(MockBackend::succeeding());
    let guard = memory_guard(config_with(&test_policy_config()), Arc::clone(&backend));

    let mut verdict = guard.submit(&test_request(5.0)).await.unwrap().verdict;
    let attacker = VerdictSecret::new("attacker-secret");
    verdict.tx_request.id = "tx-forged".to_string();
    seal_verdict(&mut verdict, &attacker);
    assert!(verify_integrity(&verdict, &attacker));

    let err = guard.execute(&verdict).await.unwrap_err();
    assert!(is_integrity_mismatch(&err));
    assert_eq!(backend.dispatch_count(), 1);
}

#[tokio::test]
async fn test_planted_record_does_not_launder_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with(&test_policy_config());

    let rejected = {
        let guard = disk_guard(dir.path(), config.clone(), Arc::new(MockBackend::succeeding()));
        guard.submit(&test_request(500.0)).await.unwrap().verdict
    };

    let key = generate_idempotency_key(&rejected, &test_secret());
    let planted = IdempotencyStore::new(StoragePaths::under(dir.path()).idempotency_file);
    planted
        .record(&key, &ExecutionResult::success("0xplanted"))
        .unwrap();

    let backend = Arc::new(MockBackend::succeeding());
    let guard = disk_guard(dir.path(), config, Arc::clone(&backend));
    assert!(guard.executor().store().contains(&key));

    let err = guard.execute(&rejected).await.unwrap_err();
    assert!(is_unapproved(&err));
    assert_eq!(backend.dispatch_count(), 0);
}

#[tokio::test]
async fn test_concurrent_reexecution_replays() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::succeeding().with_delay(Duration::from_millis(50)));
    let guard = Arc::new(disk_guard(
        dir.path(),
        config_with(&test_policy_config()),
        Arc::clone(&backend),
    ));

    let verdict = guard.submit(&test_request(5.0)).await.unwrap().verdict;
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let guard = Arc::clone(&guard);
            let verdict = verdict.clone();
            tokio::spawn(async move { guard.execute(&verdict).await.unwrap() })
        })
        .collect();

    let results: Vec<ExecutionResult> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(backend.dispatch_count(), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(guard.breaker().state().consecutive_failures, 0);
}

#[tokio::test]
async fn test_concurrent_first_execution_dispatches_once() {
    let backend = Arc::new(MockBackend::succeeding().with_delay(Duration::from_millis(50)));
    let guard = Arc::new(memory_guard(
        config_with(&test_policy_config()),
        Arc::clone(&backend),
    ));

    // Evaluate only, then race the first execution.
    let verdict = guard.engine().evaluate(&test_request(5.0)).await.unwrap();
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let guard = Arc::clone(&guard);
            let verdict = verdict.clone();
            tokio::spawn(async move { guard.execute(&verdict).await.unwrap() })
        })
        .collect();

    let results: Vec<ExecutionResult> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(backend.dispatch_count(), 1);
    assert!(results.iter().all(|r| r.success));
}

#[tokio::test]
async fn test_breaker_refusal_is_not_cached() {
    let backend = Arc::new(MockBackend::succeeding());
    let guard = memory_guard(config_with(&test_policy_config()), Arc::clone(&backend));

    let verdict = guard.engine().evaluate(&test_request(5.0)).await.unwrap();
    guard.breaker().manual_trip();

    let refused = guard.execute(&verdict).await.unwrap();
    assert!(!refused.success);
    assert_eq!(refused.error.as_deref(), Some(BREAKER_REFUSAL));
    assert_eq!(backend.dispatch_count(), 0);
    assert_eq!(guard.executor().store().size(), 0);

    assert!(guard.breaker().resume());
    let executed = guard.execute(&verdict).await.unwrap();
    assert!(executed.success);
    assert_eq!(backend.dispatch_count(), 1);
}

#[tokio::test]
async fn test_cached_result_replayed_while_tripped() {
    let backend = Arc::new(MockBackend::succeeding());
    let guard = memory_guard(config_with(&test_policy_config()), Arc::clone(&backend));

    let submission = guard.submit(&test_request(5.0)).await.unwrap();
    guard.breaker().manual_trip();

    let replayed = guard.execute(&submission.verdict).await.unwrap();
    assert_eq!(Some(replayed), submission.execution);
    assert_eq!(backend.dispatch_count(), 1);
}

#[tokio::test]
async fn test_reevaluation_is_a_new_decision() {
    let backend = Arc::new(MockBackend::succeeding());
    let guard = memory_guard(config_with(&test_policy_config()), Arc::clone(&backend));

    let request = test_request(5.0);
    let first = guard.submit(&request).await.unwrap();
    let second = guard.submit(&request).await.unwrap();

    assert_ne!(first.verdict.integrity_hash, second.verdict.integrity_hash);
    assert_eq!(backend.dispatch_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_hitl_submissions_respect_daily_limit() {
    let mut policy = test_policy_config();
    policy.max_daily_usd = 500.0;
    let backend = Arc::new(MockBackend::succeeding());
    let bridge =
        Arc::new(MockApprovalBridge::approving().with_delay(Duration::from_millis(50)));
    let guard = Arc::new(
        GuardBuilder::new(config_with(&policy))
            .secret(test_secret())
            .in_memory()
            .backend(Arc::clone(&backend) as _)
            .approval_bridge(bridge as _)
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.submit(&test_request(80.0)).await.unwrap() })
        })
        .collect();
    let submissions: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let approved = submissions.iter().filter(|s| s.verdict.approved).count();
    assert_eq!(approved, 6);
    assert_eq!(backend.dispatch_count(), 6);
    assert_eq!(guard.engine().pending_len(), 0);
}

#[tokio::test]
async fn test_unpersisted_result_not_redispatched() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let paths = StoragePaths {
        idempotency_file: blocker.join("idempotency.jsonl"),
        ..StoragePaths::under(dir.path())
    };

    let backend = Arc::new(MockBackend::succeeding());
    let guard = GuardBuilder::new(config_with(&test_policy_config()))
        .secret(test_secret())
        .storage_paths(paths)
        .backend(Arc::clone(&backend) as _)
        .build()
        .unwrap();

    let verdict = guard.engine().evaluate(&test_request(5.0)).await.unwrap();
    let err = guard.execute(&verdict).await.unwrap_err();
    assert!(matches!(err, GuardError::Executor(ExecutorError::StoreIo { .. })));

    let retry = guard.execute(&verdict).await.unwrap();
    assert!(retry.success);
    assert_eq!(backend.dispatch_count(), 1);
}
