//! Transition step tables
//!
//! Each transition direction is a fixed, ordered list of steps with an
//! explicit failure policy per step. The transition bodies iterate these
//! tables; reordering a transition means editing a table, not re-reading
//! control flow.

/// What a step failure does to the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure aborts the transition.
    Fatal,
    /// Failure is recorded and the transition continues; the attempt
    /// reports ERROR at the end. If the step achieved nothing at all it
    /// still aborts: there is nothing left to continue with.
    ContinueWithError,
    /// Failure is logged and forgotten.
    BestEffort,
}

impl FailurePolicy {
    /// Whether a step under this policy may abort the transition.
    pub fn may_abort(&self) -> bool {
        matches!(self, Self::Fatal | Self::ContinueWithError)
    }
}

/// Steps of a MASTER transition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStep {
    /// Verify the failover group is not stale on the peer.
    CheckFailoverGroup,
    /// Stop-then-start disk fencing; gates everything after it.
    StartFencing,
    /// Pool cache killcache/saved-copy bookkeeping.
    CacheBookkeeping,
    /// Import every configured volume.
    ImportVolumes,
    /// Refresh the cached failover status.
    RefreshStatus,
    RegenerateServiceConfig,
    RegenerateSystemDataset,
    RegenerateTls,
    RestartHttp,
    /// Data-path services, fixed order.
    RestartCriticalServices,
    RegenerateCron,
    SyncDisks,
    SyncEnclosure,
    RestartRemainingServices,
    /// Suppress failover-induced alerts, then re-arm the subsystem.
    RearmAlerts,
    /// Pull fresh keys from the key server if one is configured.
    ResyncKeys,
}

impl MasterStep {
    pub const ORDER: &'static [Self] = &[
        Self::CheckFailoverGroup,
        Self::StartFencing,
        Self::CacheBookkeeping,
        Self::ImportVolumes,
        Self::RefreshStatus,
        Self::RegenerateServiceConfig,
        Self::RegenerateSystemDataset,
        Self::RegenerateTls,
        Self::RestartHttp,
        Self::RestartCriticalServices,
        Self::RegenerateCron,
        Self::SyncDisks,
        Self::SyncEnclosure,
        Self::RestartRemainingServices,
        Self::RearmAlerts,
        Self::ResyncKeys,
    ];

    pub fn policy(&self) -> FailurePolicy {
        match self {
            Self::CheckFailoverGroup | Self::StartFencing => FailurePolicy::Fatal,
            Self::ImportVolumes => FailurePolicy::ContinueWithError,
            _ => FailurePolicy::BestEffort,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckFailoverGroup => "check-failover-group",
            Self::StartFencing => "start-fencing",
            Self::CacheBookkeeping => "cache-bookkeeping",
            Self::ImportVolumes => "import-volumes",
            Self::RefreshStatus => "refresh-status",
            Self::RegenerateServiceConfig => "regenerate-service-config",
            Self::RegenerateSystemDataset => "regenerate-system-dataset",
            Self::RegenerateTls => "regenerate-tls",
            Self::RestartHttp => "restart-http",
            Self::RestartCriticalServices => "restart-critical-services",
            Self::RegenerateCron => "regenerate-cron",
            Self::SyncDisks => "sync-disks",
            Self::SyncEnclosure => "sync-enclosure",
            Self::RestartRemainingServices => "restart-remaining-services",
            Self::RearmAlerts => "rearm-alerts",
            Self::ResyncKeys => "resync-keys",
        }
    }
}

/// Steps of a BACKUP transition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStep {
    CheckFailoverGroup,
    /// Release this node's disk reservations.
    StopFencing,
    RestartVipService,
    /// Sentinel first, export second; the deadline reboot must find the
    /// sentinel on disk.
    ArmWatchdogSentinel,
    ExportVolumes,
    DisarmWatchdogSentinel,
    RefreshStatus,
    RestartSyslog,
    RegenerateCron,
    StopHealthMonitor,
    StopMetricsCollector,
    RestartRemoteAccess,
    /// Ask the new MASTER to push current encryption keys.
    RequestKeySync,
}

impl BackupStep {
    pub const ORDER: &'static [Self] = &[
        Self::CheckFailoverGroup,
        Self::StopFencing,
        Self::RestartVipService,
        Self::ArmWatchdogSentinel,
        Self::ExportVolumes,
        Self::DisarmWatchdogSentinel,
        Self::RefreshStatus,
        Self::RestartSyslog,
        Self::RegenerateCron,
        Self::StopHealthMonitor,
        Self::StopMetricsCollector,
        Self::RestartRemoteAccess,
        Self::RequestKeySync,
    ];

    pub fn policy(&self) -> FailurePolicy {
        match self {
            Self::CheckFailoverGroup | Self::ExportVolumes => FailurePolicy::Fatal,
            _ => FailurePolicy::BestEffort,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckFailoverGroup => "check-failover-group",
            Self::StopFencing => "stop-fencing",
            Self::RestartVipService => "restart-vip-service",
            Self::ArmWatchdogSentinel => "arm-watchdog-sentinel",
            Self::ExportVolumes => "export-volumes",
            Self::DisarmWatchdogSentinel => "disarm-watchdog-sentinel",
            Self::RefreshStatus => "refresh-status",
            Self::RestartSyslog => "restart-syslog",
            Self::RegenerateCron => "regenerate-cron",
            Self::StopHealthMonitor => "stop-health-monitor",
            Self::StopMetricsCollector => "stop-metrics-collector",
            Self::RestartRemoteAccess => "restart-remote-access",
            Self::RequestKeySync => "request-key-sync",
        }
    }
}
