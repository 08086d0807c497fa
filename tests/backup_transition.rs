//! BACKUP Transition Tests
//!
//! Properties of the become-backup path:
//! - the watchdog sentinel is on disk while exports run, and gone only
//!   after a clean export
//! - the export deadline fires the sysrq reboot trigger and skips all
//!   cleanup
//! - the cleanup fan-out runs local-only

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use haven::cluster::testkit::MockCluster;
use haven::cluster::{GroupState, PoolStatus, ServiceEntry, VolumeEntry};
use haven::config::FailoverConfig;
use haven::failover::{
    ClusterSnapshot, FailoverOrchestrator, FatalReason, IgnoreReason, TransitionOutcome,
    TransitionRole,
};
use tempfile::TempDir;

fn standard_mock() -> MockCluster {
    let mut mock = MockCluster::new();
    mock.interface_table = vec![MockCluster::critical_interface("em0")];
    mock.volumes = vec![
        VolumeEntry::new("tank", "g1", PoolStatus::Online),
        VolumeEntry::new("dozer", "g2", PoolStatus::Online),
    ];
    mock.service_table = vec![ServiceEntry::new("ssh", true)];
    mock
}

fn fast_config(dir: &TempDir) -> FailoverConfig {
    FailoverConfig::rooted_at(dir.path())
        .with_export_timeout(Duration::from_millis(100))
        .with_export_stall(Duration::from_millis(300))
}

fn run_backup(mock: &Arc<MockCluster>, config: FailoverConfig) -> (FailoverOrchestrator, TransitionOutcome) {
    let collab = mock.collaborators();
    let snapshot = ClusterSnapshot::build(&collab).unwrap();
    let orchestrator = FailoverOrchestrator::new(collab, config);
    let outcome = orchestrator.become_backup(snapshot, "em0_v4");
    (orchestrator, outcome)
}

// =============================================================================
// Watchdog Sentinel
// =============================================================================

/// The sentinel is armed on disk while exports run.
#[test]
fn test_sentinel_is_armed_during_export() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    let sentinel_path = config.watchdog_sentinel_path.clone();
    let seen_during_export = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&seen_during_export);

    let mock = standard_mock();
    *mock.export_hook.lock().unwrap() = Some(Box::new(move |_pool| {
        if sentinel_path.exists() {
            seen.store(true, Ordering::SeqCst);
        }
    }));
    let mock = Arc::new(mock);

    let (_, outcome) = run_backup(&mock, config.clone());
    assert_eq!(outcome, TransitionOutcome::Success);
    assert!(seen_during_export.load(Ordering::SeqCst));
    // Disarmed after the clean export.
    assert!(!config.watchdog_sentinel_path.exists());
}

/// A clean export removes the sentinel; a deadline reboot leaves it.
#[test]
fn test_deadline_reboot_leaves_the_sentinel() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);

    let mut mock = standard_mock();
    mock.export_delay = Duration::from_millis(400);
    let mock = Arc::new(mock);

    let (orchestrator, outcome) = run_backup(&mock, config.clone());
    assert_eq!(
        outcome,
        TransitionOutcome::Fatal(FatalReason::ExportDeadline)
    );
    // The reboot trigger fired through sysrq.
    assert_eq!(
        std::fs::read_to_string(&config.sysrq_trigger_path).unwrap(),
        "b"
    );
    // The sentinel survives for the reboot monitor to find.
    assert!(config.watchdog_sentinel_path.exists());
    assert!(!orchestrator.last_outcome().completed);
}

/// After the deadline no cleanup runs: no status refresh, no service
/// stops, no key sync.
#[test]
fn test_deadline_skips_all_cleanup() {
    let dir = TempDir::new().unwrap();
    let mut mock = standard_mock();
    mock.export_delay = Duration::from_millis(400);
    let mock = Arc::new(mock);

    run_backup(&mock, fast_config(&dir));
    assert!(!mock.called("status.refresh"));
    assert!(!mock.called("service.stop"));
    assert!(!mock.called("peer.sync_keys"));
    assert!(!mock.called("etc.generate"));
}

/// A failed export surfaces as a deadline reboot, never a silent partial
/// export.
#[test]
fn test_export_error_becomes_a_deadline_reboot() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    let mut mock = standard_mock();
    mock.failing_exports = vec!["tank".to_string()];
    let mock = Arc::new(mock);

    let (_, outcome) = run_backup(&mock, config.clone());
    assert_eq!(
        outcome,
        TransitionOutcome::Fatal(FatalReason::ExportDeadline)
    );
    assert!(config.sysrq_trigger_path.exists());
}

// =============================================================================
// Ordering
// =============================================================================

/// Fencing stops and the VIP service restarts before the export, and the
/// exports are forced.
#[test]
fn test_fencing_stops_before_export() {
    let dir = TempDir::new().unwrap();
    let mock = Arc::new(standard_mock());

    let (_, outcome) = run_backup(&mock, fast_config(&dir));
    assert_eq!(outcome, TransitionOutcome::Success);

    let stop = mock.first_index("fenced.stop").unwrap();
    let vip = mock.first_index("service.restart keepalived").unwrap();
    let export = mock.first_index("pool.export").unwrap();
    assert!(stop < export && vip < export);
    assert!(mock.called("pool.export tank force=true"));
    assert!(mock.called("pool.export dozer force=true"));
    // Fencing is stopped, never started, on this path.
    assert!(!mock.called("fenced.start"));
}

/// A peer still MASTER on sibling interfaces makes the BACKUP event stale.
#[test]
fn test_stale_backup_event_is_ignored() {
    let dir = TempDir::new().unwrap();
    let mut mock = standard_mock();
    mock.group_state = GroupState {
        on_master: vec!["em1".to_string()],
        on_backup: vec![],
    };
    let mock = Arc::new(mock);

    let (_, outcome) = run_backup(&mock, fast_config(&dir));
    assert_eq!(
        outcome,
        TransitionOutcome::Ignored(IgnoreReason::StaleBackupEvent)
    );
    assert!(!mock.called("pool.export"));
    assert!(!mock.called("fenced.stop"));
}

// =============================================================================
// Cleanup Fan-Out
// =============================================================================

/// The post-export cleanup runs: status refresh, syslog, cron, monitors
/// stopped, remote access kept, keys requested.
#[test]
fn test_clean_backup_runs_the_cleanup_fanout() {
    let dir = TempDir::new().unwrap();
    let mock = Arc::new(standard_mock());

    let (orchestrator, outcome) = run_backup(&mock, fast_config(&dir));
    assert_eq!(outcome, TransitionOutcome::Success);

    assert!(mock.called("status.refresh"));
    assert!(mock.called("service.restart syslogd"));
    assert!(mock.called("etc.generate cron"));
    assert!(mock.called("service.stop smartd"));
    assert!(mock.called("service.stop collectd"));
    assert!(mock.called("service.restart ssh"));
    assert!(mock.called("peer.sync_keys"));

    let last = orchestrator.last_outcome();
    assert!(last.completed);
    assert_eq!(last.role, Some(TransitionRole::Backup));
}

/// Remote access is restarted only when the operator enabled it.
#[test]
fn test_disabled_ssh_is_not_restarted() {
    let dir = TempDir::new().unwrap();
    let mut mock = standard_mock();
    mock.service_table = vec![ServiceEntry::new("ssh", false)];
    let mock = Arc::new(mock);

    let (_, outcome) = run_backup(&mock, fast_config(&dir));
    assert_eq!(outcome, TransitionOutcome::Success);
    assert!(!mock.called("service.restart ssh"));
}
