//! Pool import and export
//!
//! The two storage-facing halves of a transition:
//!
//! - import every configured volume when becoming MASTER, continuing past
//!   individual failures, and
//! - force-export every volume when becoming BACKUP, under a hard deadline
//!   that reboots the node if exports hang.
//!
//! The deadline is explicit: the export worker runs on its own thread and
//! the caller waits on a channel with a timeout. After any export error
//! the worker stalls longer than the deadline on purpose, so a failed
//! export always surfaces as a deadline reboot rather than a silent
//! partial export.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::cluster::{ImportOptions, PoolManager, VolumeEntry};
use crate::config::FailoverConfig;
use crate::observability::{Event, Logger};

use super::errors::ImportFailure;
use super::reboot::RebootTrigger;

/// What happened across one import pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of volumes attempted.
    pub attempted: usize,
    /// Volumes that failed, in attempt order.
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    /// True when every attempted import failed. An empty pass is not a
    /// total failure; there was nothing to do.
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failures.len() == self.attempted
    }
}

/// Terminal state of one export pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportVerdict {
    /// Every export finished inside the deadline.
    Exported,
    /// The deadline elapsed and the reboot trigger fired. The caller must
    /// not run any cleanup; the node is going down.
    RebootTriggered,
}

pub struct StorageTransitionManager {
    pools: Arc<dyn PoolManager>,
    config: FailoverConfig,
}

impl StorageTransitionManager {
    pub fn new(pools: Arc<dyn PoolManager>, config: FailoverConfig) -> Self {
        Self { pools, config }
    }

    /// Import every volume, continuing past individual failures. Encrypted
    /// datasets are unlocked after each successful import; unlock failures
    /// are logged but never fail the import.
    pub fn import_all(&self, volumes: &[VolumeEntry]) -> ImportReport {
        let options = ImportOptions {
            altroot: self.config.altroot.clone(),
            cachefile: self.config.pool_cache_path.clone(),
        };

        let mut failures = Vec::new();
        for volume in volumes {
            Logger::info(
                Event::VolumeImportStart.name(),
                &[("guid", &volume.guid), ("volume", &volume.name)],
            );
            match self.pools.import(&volume.guid, &options) {
                Ok(()) => self.unlock(volume),
                Err(e) => {
                    Logger::error(
                        Event::VolumeImportFailed.name(),
                        &[("error", &e.message), ("volume", &volume.name)],
                    );
                    failures.push(ImportFailure {
                        volume: volume.name.clone(),
                        guid: volume.guid.clone(),
                        error: e.message,
                    });
                }
            }
        }

        Logger::info(
            Event::VolumeImportsComplete.name(),
            &[
                ("attempted", &volumes.len().to_string()),
                ("failed", &failures.len().to_string()),
            ],
        );

        ImportReport {
            attempted: volumes.len(),
            failures,
        }
    }

    fn unlock(&self, volume: &VolumeEntry) {
        match self.pools.unlock_datasets(&volume.name) {
            Ok(report) => {
                for dataset in &report.failed {
                    Logger::error(
                        Event::DatasetUnlockFailed.name(),
                        &[("dataset", dataset), ("volume", &volume.name)],
                    );
                }
            }
            Err(e) => {
                Logger::error(
                    Event::DatasetUnlockFailed.name(),
                    &[("error", &e.message), ("volume", &volume.name)],
                );
            }
        }
    }

    /// Force-export every volume under the hard deadline. On deadline the
    /// reboot trigger fires and `RebootTriggered` is returned; the caller
    /// owns nothing at that point.
    pub fn export_all(&self, volumes: &[VolumeEntry], reboot: &RebootTrigger) -> ExportVerdict {
        let (tx, rx) = mpsc::channel();
        let pools = Arc::clone(&self.pools);
        let names: Vec<String> = volumes.iter().map(|v| v.name.clone()).collect();
        let stall = self.config.export_stall;

        let spawned = thread::Builder::new()
            .name("pool-export".to_string())
            .spawn(move || {
                for name in names {
                    match pools.export(&name, true) {
                        Ok(()) => {
                            Logger::info(Event::VolumeExported.name(), &[("volume", &name)]);
                        }
                        Err(e) => {
                            Logger::error(
                                Event::VolumeExportFailed.name(),
                                &[("error", &e.message), ("volume", &name)],
                            );
                            // Hold the completion signal past the deadline.
                            // A pool that refused a forced export cannot be
                            // trusted to the peer without a reboot.
                            thread::sleep(stall);
                            return;
                        }
                    }
                }
                let _ = tx.send(());
            });

        if spawned.is_err() {
            reboot.fire();
            return ExportVerdict::RebootTriggered;
        }

        match rx.recv_timeout(self.config.export_timeout) {
            Ok(()) => ExportVerdict::Exported,
            Err(_) => {
                Logger::fatal(
                    Event::ExportDeadlineElapsed.name(),
                    &[("timeout_secs", &self.config.export_timeout.as_secs().to_string())],
                );
                reboot.fire();
                ExportVerdict::RebootTriggered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testkit::MockCluster;
    use crate::cluster::PoolStatus;
    use std::time::Duration;
    use tempfile::TempDir;

    fn volumes() -> Vec<VolumeEntry> {
        vec![
            VolumeEntry::new("tank", "g1", PoolStatus::Offline),
            VolumeEntry::new("dozer", "g2", PoolStatus::Offline),
        ]
    }

    fn fast_config(dir: &TempDir) -> FailoverConfig {
        FailoverConfig::rooted_at(dir.path())
            .with_export_timeout(Duration::from_millis(100))
            .with_export_stall(Duration::from_millis(300))
    }

    #[test]
    fn import_continues_past_failures() {
        let mut mock = MockCluster::new();
        mock.failing_imports = vec!["g1".to_string()];
        let mock = Arc::new(mock);
        let dir = TempDir::new().unwrap();
        let manager = StorageTransitionManager::new(
            Arc::clone(&mock) as Arc<dyn PoolManager>,
            fast_config(&dir),
        );

        let report = manager.import_all(&volumes());
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].volume, "tank");
        assert!(!report.all_failed());
        // The second import was still attempted.
        assert!(mock.called("pool.import g2"));
        // Only the successful import unlocks datasets.
        assert!(mock.called("pool.unlock dozer"));
        assert!(!mock.called("pool.unlock tank"));
    }

    #[test]
    fn all_failed_requires_every_import_to_fail() {
        let mut mock = MockCluster::new();
        mock.failing_imports = vec!["g1".to_string(), "g2".to_string()];
        let mock = Arc::new(mock);
        let dir = TempDir::new().unwrap();
        let manager = StorageTransitionManager::new(
            Arc::clone(&mock) as Arc<dyn PoolManager>,
            fast_config(&dir),
        );

        let report = manager.import_all(&volumes());
        assert!(report.all_failed());
    }

    #[test]
    fn clean_export_beats_the_deadline() {
        let mock = Arc::new(MockCluster::new());
        let dir = TempDir::new().unwrap();
        let config = fast_config(&dir);
        let manager =
            StorageTransitionManager::new(Arc::clone(&mock) as Arc<dyn PoolManager>, config.clone());
        let reboot = RebootTrigger::new(&config);

        let verdict = manager.export_all(&volumes(), &reboot);
        assert_eq!(verdict, ExportVerdict::Exported);
        assert!(mock.called("pool.export tank force=true"));
        assert!(mock.called("pool.export dozer force=true"));
        assert!(!config.sysrq_trigger_path.exists());
    }

    #[test]
    fn stuck_export_fires_the_reboot_trigger() {
        let mut mock = MockCluster::new();
        mock.export_delay = Duration::from_millis(400);
        let mock = Arc::new(mock);
        let dir = TempDir::new().unwrap();
        let config = fast_config(&dir);
        let manager =
            StorageTransitionManager::new(Arc::clone(&mock) as Arc<dyn PoolManager>, config.clone());
        let reboot = RebootTrigger::new(&config);

        let verdict = manager.export_all(&volumes(), &reboot);
        assert_eq!(verdict, ExportVerdict::RebootTriggered);
        assert_eq!(
            std::fs::read_to_string(&config.sysrq_trigger_path).unwrap(),
            "b"
        );
    }

    #[test]
    fn export_error_surfaces_as_deadline_reboot() {
        let mut mock = MockCluster::new();
        mock.failing_exports = vec!["tank".to_string()];
        let mock = Arc::new(mock);
        let dir = TempDir::new().unwrap();
        let config = fast_config(&dir);
        let manager =
            StorageTransitionManager::new(Arc::clone(&mock) as Arc<dyn PoolManager>, config.clone());
        let reboot = RebootTrigger::new(&config);

        let verdict = manager.export_all(&volumes(), &reboot);
        assert_eq!(verdict, ExportVerdict::RebootTriggered);
        // The failed export aborts the pass before the second volume.
        assert!(!mock.called("pool.export dozer"));
    }
}
