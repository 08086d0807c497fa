//! Local failover status detection
//!
//! Answers "what is this node right now" from local state only: interface
//! configuration, pool status, VRRP state, and any transition in flight.
//! No peer calls; status must be answerable while the peer is down.

use crate::cluster::{best_effort, Collaborators};

use super::jobs::{JobRegistry, BECOME_BACKUP, BECOME_MASTER};
use super::state::TransitionPhase;

/// Locally observable failover status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverStatus {
    /// Not an HA pair: no VIP-carrying interfaces, or no pools.
    Single,
    Master,
    Backup,
    /// A transition is in its election phase.
    Electing,
    Importing,
    Exporting,
    /// VRRP says MASTER but no pool is available and nothing is running
    /// to fix that.
    Error,
    /// Local state could not be read.
    Unknown,
}

impl FailoverStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Master => "MASTER",
            Self::Backup => "BACKUP",
            Self::Electing => "ELECTING",
            Self::Importing => "IMPORTING",
            Self::Exporting => "EXPORTING",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Detect this node's failover status from local state.
pub fn detect_local(collab: &Collaborators, registry: &JobRegistry) -> FailoverStatus {
    let interfaces = match best_effort(collab.db.interfaces()) {
        Some(interfaces) => interfaces,
        None => return FailoverStatus::Unknown,
    };
    if !interfaces.iter().any(|i| i.has_vip) {
        return FailoverStatus::Single;
    }

    let volumes = match best_effort(collab.pools.query()) {
        Some(volumes) => volumes,
        None => return FailoverStatus::Unknown,
    };
    if volumes.is_empty() {
        return FailoverStatus::Single;
    }

    let masters = best_effort(collab.vip.master_interfaces()).unwrap_or_default();
    if masters.is_empty() {
        // No local MASTER interfaces. The node may still be mid-backup,
        // but BACKUP is the honest answer either way.
        return FailoverStatus::Backup;
    }

    // Any pool not outright offline means storage is (at least partly)
    // here and serving.
    if volumes
        .iter()
        .any(|v| v.status != crate::cluster::PoolStatus::Offline)
    {
        return FailoverStatus::Master;
    }

    // MASTER interfaces without storage: report the in-flight transition
    // phase if one is running, otherwise something is wrong.
    let phase = registry
        .running_phase(BECOME_MASTER)
        .or_else(|| registry.running_phase(BECOME_BACKUP));
    match phase {
        Some(TransitionPhase::Received) | Some(TransitionPhase::Electing) => {
            FailoverStatus::Electing
        }
        Some(TransitionPhase::Importing) => FailoverStatus::Importing,
        Some(TransitionPhase::Exporting) => FailoverStatus::Exporting,
        Some(_) | None => FailoverStatus::Error,
    }
}
