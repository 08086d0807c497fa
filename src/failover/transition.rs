//! Transition bodies
//!
//! One struct per direction, each owning everything its attempt needs:
//! the snapshot, the job handle, the fencing gate, the storage manager,
//! and the service coordinator. `run` consumes the transition, walks the
//! step table for its direction, and returns the terminal outcome.
//!
//! Failure policy lives in the step tables; a step body may only return
//! `Fatal` if its table entry says `Fatal`, which is asserted in debug
//! builds.

use crate::cluster::{best_effort, Collaborators};
use crate::config::FailoverConfig;
use crate::observability::{Event, Logger};

use super::errors::{FatalReason, IgnoreReason, ImportFailure, TransitionOutcome};
use super::fencing::FencingGate;
use super::jobs::JobHandle;
use super::markers::{CacheBookkeeping, WatchdogSentinel};
use super::reboot::RebootTrigger;
use super::services::ServiceRestartCoordinator;
use super::snapshot::ClusterSnapshot;
use super::state::TransitionPhase;
use super::steps::{BackupStep, MasterStep};
use super::storage::{ExportVerdict, StorageTransitionManager};

/// What one step did to the transition.
enum StepStatus {
    Completed,
    Ignored(IgnoreReason),
    Fatal(FatalReason),
}

pub(crate) struct MasterTransition {
    collab: Collaborators,
    snapshot: ClusterSnapshot,
    interface: String,
    /// Force fencing to take reservations even over an active holder.
    force_fenced: bool,
    /// Operator-initiated; skips the stale-group check.
    forcetakeover: bool,
    job: JobHandle,
    gate: FencingGate,
    storage: StorageTransitionManager,
    services: ServiceRestartCoordinator,
    cache: CacheBookkeeping,
    import_failures: Vec<ImportFailure>,
}

impl MasterTransition {
    pub(crate) fn new(
        collab: Collaborators,
        config: FailoverConfig,
        snapshot: ClusterSnapshot,
        interface: String,
        force_fenced: bool,
        forcetakeover: bool,
        job: JobHandle,
    ) -> Self {
        let gate = FencingGate::new(std::sync::Arc::clone(&collab.fence));
        let storage =
            StorageTransitionManager::new(std::sync::Arc::clone(&collab.pools), config.clone());
        let services =
            ServiceRestartCoordinator::new(std::sync::Arc::clone(&collab.services));
        let cache = CacheBookkeeping::new(&config);
        Self {
            collab,
            snapshot,
            interface,
            force_fenced,
            forcetakeover,
            job,
            gate,
            storage,
            services,
            cache,
            import_failures: Vec::new(),
        }
    }

    fn forced(&self) -> bool {
        self.forcetakeover || self.force_fenced
    }

    pub(crate) fn run(mut self) -> TransitionOutcome {
        self.job.set_phase(TransitionPhase::Electing);
        Logger::warn(
            Event::ElectionEntered.name(),
            &[("interface", &self.interface), ("role", "MASTER")],
        );

        for step in MasterStep::ORDER {
            match self.execute(*step) {
                StepStatus::Completed => {}
                StepStatus::Ignored(reason) => {
                    self.job.set_phase(TransitionPhase::Ignored);
                    return TransitionOutcome::Ignored(reason);
                }
                StepStatus::Fatal(reason) => {
                    debug_assert!(step.policy().may_abort());
                    self.job.set_phase(TransitionPhase::Failed);
                    Logger::error(
                        Event::TransitionFailed.name(),
                        &[("role", "MASTER"), ("step", step.name())],
                    );
                    return TransitionOutcome::Fatal(reason);
                }
            }
        }

        self.job.set_phase(TransitionPhase::Done);
        Logger::warn(
            Event::TransitionComplete.name(),
            &[
                ("failed_imports", &self.import_failures.len().to_string()),
                ("role", "MASTER"),
            ],
        );
        if self.import_failures.is_empty() {
            TransitionOutcome::Success
        } else {
            TransitionOutcome::PartialFailure(self.import_failures)
        }
    }

    fn execute(&mut self, step: MasterStep) -> StepStatus {
        match step {
            MasterStep::CheckFailoverGroup => {
                // A forced takeover or forced fencing claims the disks no
                // matter what the peer still advertises.
                if self.forced() {
                    return StepStatus::Completed;
                }
                let state = match best_effort(
                    self.collab
                        .vip
                        .group_state(&self.interface, &self.snapshot.groups),
                ) {
                    Some(state) => state,
                    // An unreadable peer cannot veto the takeover.
                    None => return StepStatus::Completed,
                };
                if !state.on_backup.is_empty() {
                    return StepStatus::Ignored(IgnoreReason::StaleMasterEvent);
                }
                StepStatus::Completed
            }
            MasterStep::StartFencing => {
                let result = self.gate.restart(self.forced());
                if result.is_ok() {
                    StepStatus::Completed
                } else {
                    Logger::error(
                        Event::FencedFailed.name(),
                        &[("detail", &result.diagnostic())],
                    );
                    StepStatus::Fatal(FatalReason::Fencing(result))
                }
            }
            MasterStep::CacheBookkeeping => {
                self.cache.apply();
                StepStatus::Completed
            }
            MasterStep::ImportVolumes => {
                self.job.set_phase(TransitionPhase::Importing);
                let report = self.storage.import_all(&self.snapshot.volumes);
                if report.all_failed() {
                    return StepStatus::Fatal(FatalReason::AllImportsFailed(report.failures));
                }
                self.import_failures = report.failures;
                StepStatus::Completed
            }
            MasterStep::RefreshStatus => {
                if best_effort(self.collab.status.refresh()).is_some() {
                    Logger::info(Event::StatusRefreshed.name(), &[]);
                }
                StepStatus::Completed
            }
            MasterStep::RegenerateServiceConfig => self.regenerate("rc"),
            MasterStep::RegenerateSystemDataset => self.regenerate("system_dataset"),
            MasterStep::RegenerateTls => self.regenerate("ssl"),
            MasterStep::RestartHttp => {
                self.services.restart_local("http");
                StepStatus::Completed
            }
            MasterStep::RestartCriticalServices => {
                self.services.restart_critical(&self.snapshot.services);
                StepStatus::Completed
            }
            MasterStep::RegenerateCron => self.regenerate("cron"),
            MasterStep::SyncDisks => {
                best_effort(self.collab.hardware.sync_disks());
                StepStatus::Completed
            }
            MasterStep::SyncEnclosure => {
                best_effort(self.collab.hardware.sync_enclosure());
                StepStatus::Completed
            }
            MasterStep::RestartRemainingServices => {
                self.services.restart_local("collectd");
                self.services.restart_local("syslogd");
                self.services.restart_remaining(&self.snapshot.services);
                StepStatus::Completed
            }
            MasterStep::RearmAlerts => {
                best_effort(self.collab.alerts.block_failover_alerts());
                best_effort(self.collab.alerts.initialize(false));
                StepStatus::Completed
            }
            MasterStep::ResyncKeys => {
                if let Some(config) = best_effort(self.collab.keys.config()) {
                    if config.enabled {
                        best_effort(self.collab.keys.resync_keys());
                    }
                }
                StepStatus::Completed
            }
        }
    }

    fn regenerate(&self, subsystem: &str) -> StepStatus {
        if best_effort(self.collab.etc.generate(subsystem)).is_some() {
            Logger::info(Event::ConfigRegenerated.name(), &[("subsystem", subsystem)]);
        }
        StepStatus::Completed
    }
}

pub(crate) struct BackupTransition {
    collab: Collaborators,
    snapshot: ClusterSnapshot,
    interface: String,
    job: JobHandle,
    gate: FencingGate,
    storage: StorageTransitionManager,
    services: ServiceRestartCoordinator,
    sentinel: WatchdogSentinel,
    reboot: RebootTrigger,
}

impl BackupTransition {
    pub(crate) fn new(
        collab: Collaborators,
        config: FailoverConfig,
        snapshot: ClusterSnapshot,
        interface: String,
        job: JobHandle,
    ) -> Self {
        let gate = FencingGate::new(std::sync::Arc::clone(&collab.fence));
        let storage =
            StorageTransitionManager::new(std::sync::Arc::clone(&collab.pools), config.clone());
        let services =
            ServiceRestartCoordinator::new(std::sync::Arc::clone(&collab.services));
        let sentinel = WatchdogSentinel::new(&config);
        let reboot = RebootTrigger::new(&config);
        Self {
            collab,
            snapshot,
            interface,
            job,
            gate,
            storage,
            services,
            sentinel,
            reboot,
        }
    }

    pub(crate) fn run(self) -> TransitionOutcome {
        self.job.set_phase(TransitionPhase::Electing);
        Logger::warn(
            Event::ElectionEntered.name(),
            &[("interface", &self.interface), ("role", "BACKUP")],
        );

        for step in BackupStep::ORDER {
            match self.execute(*step) {
                StepStatus::Completed => {}
                StepStatus::Ignored(reason) => {
                    self.job.set_phase(TransitionPhase::Ignored);
                    return TransitionOutcome::Ignored(reason);
                }
                StepStatus::Fatal(reason) => {
                    debug_assert!(step.policy().may_abort());
                    self.job.set_phase(TransitionPhase::Failed);
                    Logger::error(
                        Event::TransitionFailed.name(),
                        &[("role", "BACKUP"), ("step", step.name())],
                    );
                    return TransitionOutcome::Fatal(reason);
                }
            }
        }

        self.job.set_phase(TransitionPhase::Done);
        Logger::warn(Event::TransitionComplete.name(), &[("role", "BACKUP")]);
        TransitionOutcome::Success
    }

    fn execute(&self, step: BackupStep) -> StepStatus {
        match step {
            BackupStep::CheckFailoverGroup => {
                let state = match best_effort(
                    self.collab
                        .vip
                        .group_state(&self.interface, &self.snapshot.groups),
                ) {
                    Some(state) => state,
                    None => return StepStatus::Completed,
                };
                if !state.on_master.is_empty() {
                    return StepStatus::Ignored(IgnoreReason::StaleBackupEvent);
                }
                StepStatus::Completed
            }
            BackupStep::StopFencing => {
                self.gate.stop();
                StepStatus::Completed
            }
            BackupStep::RestartVipService => {
                self.services.restart_local("keepalived");
                StepStatus::Completed
            }
            BackupStep::ArmWatchdogSentinel => {
                // An unarmed sentinel only misreports the reboot cause;
                // the export still runs.
                if let Err(e) = self.sentinel.arm() {
                    Logger::error(
                        Event::WatchdogSentinelArmed.name(),
                        &[("error", &e.to_string())],
                    );
                }
                StepStatus::Completed
            }
            BackupStep::ExportVolumes => {
                self.job.set_phase(TransitionPhase::Exporting);
                match self.storage.export_all(&self.snapshot.volumes, &self.reboot) {
                    ExportVerdict::Exported => StepStatus::Completed,
                    ExportVerdict::RebootTriggered => {
                        StepStatus::Fatal(FatalReason::ExportDeadline)
                    }
                }
            }
            BackupStep::DisarmWatchdogSentinel => {
                self.sentinel.disarm();
                StepStatus::Completed
            }
            BackupStep::RefreshStatus => {
                if best_effort(self.collab.status.refresh()).is_some() {
                    Logger::info(Event::StatusRefreshed.name(), &[]);
                }
                StepStatus::Completed
            }
            BackupStep::RestartSyslog => {
                self.services.restart_local("syslogd");
                StepStatus::Completed
            }
            BackupStep::RegenerateCron => {
                if best_effort(self.collab.etc.generate("cron")).is_some() {
                    Logger::info(Event::ConfigRegenerated.name(), &[("subsystem", "cron")]);
                }
                StepStatus::Completed
            }
            BackupStep::StopHealthMonitor => {
                self.services.stop_local("smartd");
                StepStatus::Completed
            }
            BackupStep::StopMetricsCollector => {
                self.services.stop_local("collectd");
                StepStatus::Completed
            }
            BackupStep::RestartRemoteAccess => {
                if self.snapshot.service_enabled("ssh") {
                    self.services.restart_local("ssh");
                }
                StepStatus::Completed
            }
            BackupStep::RequestKeySync => {
                if best_effort(self.collab.peer.request_key_sync()).is_some() {
                    Logger::info(Event::KeySyncRequested.name(), &[]);
                }
                StepStatus::Completed
            }
        }
    }
}
