//! Observable events in the failover core
//!
//! Events are explicit and typed. Every event name that can appear in the
//! log is enumerated here; free-form event strings are reserved for
//! collaborator call failures, which carry the remote method name instead.

use std::fmt;

/// Observable failover events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Intake
    /// A VRRP state-change line was received
    RoleEventReceived,
    /// The role-changed notification was published to observers
    RoleChangePublished,
    /// The event was ignored before any transition started
    RoleEventIgnored,

    // Election / fencing
    /// A MASTER transition entered its election phase
    ElectionEntered,
    /// Fencing was stopped
    FencedStopped,
    /// Fencing was started
    FencedStarted,
    /// Fencing returned a non-OK result; the transition aborts
    FencedFailed,

    // Storage
    /// Pool cache bookkeeping ran
    CacheBookkeeping,
    /// A volume import started
    VolumeImportStart,
    /// A volume import failed
    VolumeImportFailed,
    /// All imports finished (possibly with failures)
    VolumeImportsComplete,
    /// Encrypted dataset unlock failed (non-fatal)
    DatasetUnlockFailed,
    /// A volume was force-exported
    VolumeExported,
    /// A volume export failed; the deadline will fire
    VolumeExportFailed,
    /// The export deadline elapsed before exports finished
    ExportDeadlineElapsed,
    /// The low-level reboot trigger was invoked
    RebootTriggered,

    // Sentinels
    /// Watchdog sentinel written before export
    WatchdogSentinelArmed,
    /// Watchdog sentinel removed after a clean export
    WatchdogSentinelDisarmed,

    // Fan-out
    /// A service was restarted (local-only)
    ServiceRestarted,
    /// A service was stopped (local-only)
    ServiceStopped,
    /// Subsystem configuration was regenerated
    ConfigRegenerated,
    /// Cluster status refresh requested
    StatusRefreshed,
    /// Peer asked to push current encryption keys
    KeySyncRequested,

    // Terminal
    /// A transition reached SUCCESS
    TransitionComplete,
    /// A transition reached ERROR
    TransitionFailed,
    /// A collaborator call failed and was swallowed
    CollaboratorCallFailed,
}

impl Event {
    /// The event name as it appears in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoleEventReceived => "ROLE_EVENT_RECEIVED",
            Self::RoleChangePublished => "ROLE_CHANGE_PUBLISHED",
            Self::RoleEventIgnored => "ROLE_EVENT_IGNORED",
            Self::ElectionEntered => "ELECTION_ENTERED",
            Self::FencedStopped => "FENCED_STOPPED",
            Self::FencedStarted => "FENCED_STARTED",
            Self::FencedFailed => "FENCED_FAILED",
            Self::CacheBookkeeping => "CACHE_BOOKKEEPING",
            Self::VolumeImportStart => "VOLUME_IMPORT_START",
            Self::VolumeImportFailed => "VOLUME_IMPORT_FAILED",
            Self::VolumeImportsComplete => "VOLUME_IMPORTS_COMPLETE",
            Self::DatasetUnlockFailed => "DATASET_UNLOCK_FAILED",
            Self::VolumeExported => "VOLUME_EXPORTED",
            Self::VolumeExportFailed => "VOLUME_EXPORT_FAILED",
            Self::ExportDeadlineElapsed => "EXPORT_DEADLINE_ELAPSED",
            Self::RebootTriggered => "REBOOT_TRIGGERED",
            Self::WatchdogSentinelArmed => "WATCHDOG_SENTINEL_ARMED",
            Self::WatchdogSentinelDisarmed => "WATCHDOG_SENTINEL_DISARMED",
            Self::ServiceRestarted => "SERVICE_RESTARTED",
            Self::ServiceStopped => "SERVICE_STOPPED",
            Self::ConfigRegenerated => "CONFIG_REGENERATED",
            Self::StatusRefreshed => "STATUS_REFRESHED",
            Self::KeySyncRequested => "KEY_SYNC_REQUESTED",
            Self::TransitionComplete => "TRANSITION_COMPLETE",
            Self::TransitionFailed => "TRANSITION_FAILED",
            Self::CollaboratorCallFailed => "COLLABORATOR_CALL_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
