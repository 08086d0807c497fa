//! Shared collaborator data types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Status of a storage pool as reported by the pool manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    Online,
    Degraded,
    Offline,
    Unavailable,
}

impl PoolStatus {
    /// True when the pool is imported on this node. Only `Online` counts;
    /// a degraded pool still needs the import path to reconcile it.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Degraded => "DEGRADED",
            Self::Offline => "OFFLINE",
            Self::Unavailable => "UNAVAIL",
        }
    }
}

/// One configured volume: the identity the import/export paths work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    pub name: String,
    pub guid: String,
    pub status: PoolStatus,
}

impl VolumeEntry {
    pub fn new(name: impl Into<String>, guid: impl Into<String>, status: PoolStatus) -> Self {
        Self {
            name: name.into(),
            guid: guid.into(),
            status,
        }
    }
}

/// One configured service and whether the operator enabled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub enabled: bool,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

/// One network interface as the failover core sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub name: String,
    /// A state change on a non-critical interface never triggers failover.
    pub critical: bool,
    /// Failover group this interface belongs to.
    pub failover_group: u32,
    /// Whether the interface carries VRRP configuration.
    pub has_vip: bool,
}

/// HA configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaConfig {
    /// Failover disabled by the operator.
    pub disabled: bool,
    /// This node is the designated master.
    pub master: bool,
    /// Election timeout configured for the VRRP layer.
    pub timeout: Duration,
}

/// The peer's failover status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    Master,
    Backup,
    Unknown,
}

/// Peer-side VRRP state of the sibling interfaces in one failover group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupState {
    /// Sibling interfaces the peer still reports as MASTER.
    pub on_master: Vec<String>,
    /// Sibling interfaces the peer still reports as BACKUP.
    pub on_backup: Vec<String>,
}

/// Result of unlocking a pool's encrypted datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockReport {
    /// Datasets that failed to unlock.
    pub failed: Vec<String>,
}

/// Key-management integration configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyServerConfig {
    pub enabled: bool,
}

/// Options passed to a pool import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub altroot: PathBuf,
    pub cachefile: PathBuf,
}

/// Outbound role-changed notification, published for every MASTER/BACKUP
/// line regardless of whether the event is subsequently acted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChanged {
    #[serde(rename = "type")]
    pub kind: String,
    pub interface: String,
    pub role: String,
}

impl RoleChanged {
    pub fn new(interface: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            kind: "role-changed".to_string(),
            interface: interface.into(),
            role: role.into(),
        }
    }
}
