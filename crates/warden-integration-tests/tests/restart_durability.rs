//! State that must survive a process restart: executed results, the
//! decision window, and tolerance for damaged files.

mod common;

use std::io::Write;
use std::sync::Arc;

use chrono::Duration;
use warden_audit::{AUDIT_FILE_NAME, AuditLog};
use warden_config::StoragePaths;
use warden_core::PolicyKind;
use warden_runtime::GuardError;
use warden_test::{MockBackend, approved_entry, test_policy_config, test_request};

use common::{config_with, disk_guard};

#[tokio::test]
async fn test_executed_verdict_not_redispatched_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with(&test_policy_config());

    let first_backend = Arc::new(MockBackend::succeeding());
    let (verdict, first_result) = {
        let guard = disk_guard(dir.path(), config.clone(), Arc::clone(&first_backend));
        let submission = guard.submit(&test_request(20.0)).await.unwrap();
        (submission.verdict, submission.execution.unwrap())
    };
    assert_eq!(first_backend.dispatch_count(), 1);

    let second_backend = Arc::new(MockBackend::succeeding());
    let guard = disk_guard(dir.path(), config, Arc::clone(&second_backend));
    let replayed = guard.execute(&verdict).await.unwrap();

    assert_eq!(replayed, first_result);
    assert_eq!(second_backend.dispatch_count(), 0);
}

#[tokio::test]
async fn test_rate_window_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut policy = test_policy_config();
    policy.max_transactions_per_hour = 2;
    let config = config_with(&policy);

    {
        let guard = disk_guard(dir.path(), config.clone(), Arc::new(MockBackend::succeeding()));
        for _ in 0..2 {
            assert!(guard.submit(&test_request(5.0)).await.unwrap().verdict.approved);
        }
    }

    let guard = disk_guard(dir.path(), config, Arc::new(MockBackend::succeeding()));
    assert_eq!(guard.engine().history_len(), 2);
    let third = guard.submit(&test_request(5.0)).await.unwrap();
    assert!(!third.verdict.approved);
    assert!(third.verdict.has_violation(PolicyKind::RateLimit));
}

#[tokio::test]
async fn test_entries_older_than_a_day_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::under(dir.path());
    let log = AuditLog::open(&paths.audit_dir).unwrap();
    log.record(&approved_entry(90.0, Duration::hours(30))).unwrap();
    log.record(&approved_entry(10.0, Duration::hours(2))).unwrap();

    let mut policy = test_policy_config();
    policy.max_daily_usd = 100.0;
    policy.hitl_threshold_usd = 95.0;
    let guard = disk_guard(
        dir.path(),
        config_with(&policy),
        Arc::new(MockBackend::succeeding()),
    );

    assert_eq!(guard.engine().history_len(), 1);
    assert_eq!(guard.audit_log().count().unwrap(), 2);
    let submission = guard.submit(&test_request(85.0)).await.unwrap();
    assert!(submission.verdict.approved);
}

#[tokio::test]
async fn test_corrupt_lines_skipped_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::under(dir.path());
    let config = config_with(&test_policy_config());

    let verdict = {
        let guard = disk_guard(dir.path(), config.clone(), Arc::new(MockBackend::succeeding()));
        guard.submit(&test_request(5.0)).await.unwrap().verdict
    };

    for path in [
        paths.audit_dir.join(AUDIT_FILE_NAME),
        paths.idempotency_file.clone(),
    ] {
        let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(b"{\"truncated\": \n").unwrap();
    }

    let backend = Arc::new(MockBackend::succeeding());
    let guard = disk_guard(dir.path(), config, Arc::clone(&backend));
    assert_eq!(guard.engine().history_len(), 1);
    assert_eq!(guard.executor().store().size(), 1);

    guard.execute(&verdict).await.unwrap();
    assert_eq!(backend.dispatch_count(), 0);
}

#[tokio::test]
async fn test_unreadable_audit_log_degrades_to_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::under(dir.path());
    // A directory where the log file should be: opens, but cannot be read.
    std::fs::create_dir_all(paths.audit_dir.join(AUDIT_FILE_NAME)).unwrap();

    let guard = disk_guard(
        dir.path(),
        config_with(&test_policy_config()),
        Arc::new(MockBackend::succeeding()),
    );
    assert_eq!(guard.engine().history_len(), 0);

    let err = guard.submit(&test_request(5.0)).await.unwrap_err();
    assert!(matches!(err, GuardError::Policy(_)));
}

#[tokio::test]
async fn test_unreadable_idempotency_store_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::under(dir.path());
    std::fs::create_dir_all(&paths.idempotency_file).unwrap();

    let guard = disk_guard(
        dir.path(),
        config_with(&test_policy_config()),
        Arc::new(MockBackend::succeeding()),
    );
    assert_eq!(guard.executor().store().size(), 0);
}
