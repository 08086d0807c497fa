//! Collaborator contracts
//!
//! The failover core never talks to the storage engine, the service manager,
//! the fencing daemon, or the peer controller directly. Each collaborator is
//! a narrow trait; production wires them to the middleware RPC layer, tests
//! wire them to [`testkit::MockCluster`].
//!
//! Every collaborator call may fail. Failure policy is decided by the
//! caller: most call sites go through [`best_effort`], which logs the error
//! with the remote method name and swallows it, because a half-finished
//! failover is better than no failover.

mod types;

pub mod testkit;

pub use types::{
    GroupState, HaConfig, ImportOptions, InterfaceEntry, KeyServerConfig, PeerStatus,
    PoolStatus, RoleChanged, ServiceEntry, UnlockReport, VolumeEntry,
};

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::observability::{Event, Logger};

/// A failed collaborator call, tagged with the remote method name.
#[derive(Debug, Clone, Error)]
#[error("{method} failed: {message}")]
pub struct CallError {
    /// Remote method name, e.g. `pool.import`
    pub method: &'static str,
    /// Collaborator-supplied failure detail
    pub message: String,
}

impl CallError {
    /// Create a new call error.
    pub fn new(method: &'static str, message: impl Into<String>) -> Self {
        Self {
            method,
            message: message.into(),
        }
    }
}

/// Result type for collaborator calls.
pub type CallResult<T> = Result<T, CallError>;

/// Log and swallow a collaborator failure.
///
/// Mirrors the dispatch wrapper the failover core has always used: the
/// failure is recorded with enough context to diagnose, and the caller gets
/// `None` instead of an error to propagate.
pub fn best_effort<T>(result: CallResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            Logger::error(
                Event::CollaboratorCallFailed.name(),
                &[("method", e.method), ("error", &e.message)],
            );
            None
        }
    }
}

/// Pool query, import, export, and encrypted-dataset unlock.
pub trait PoolManager: Send + Sync {
    /// List all configured volumes with name, guid, and status.
    fn query(&self) -> CallResult<Vec<VolumeEntry>>;

    /// Import the pool with the given guid.
    fn import(&self, guid: &str, options: &ImportOptions) -> CallResult<()>;

    /// Force-export the named pool.
    fn export(&self, name: &str, force: bool) -> CallResult<()>;

    /// Unlock any encrypted datasets belonging to the named pool.
    fn unlock_datasets(&self, pool: &str) -> CallResult<UnlockReport>;
}

/// Service restart/stop with explicit peer-propagation control.
pub trait ServiceManager: Send + Sync {
    /// Restart a service. `propagate_to_peer = false` keeps the state
    /// change local; the peer reconciles through its own failover logic.
    fn restart(&self, name: &str, propagate_to_peer: bool) -> CallResult<()>;

    /// Stop a service, with the same propagation contract as `restart`.
    fn stop(&self, name: &str, propagate_to_peer: bool) -> CallResult<()>;
}

/// Start/stop contract of the external disk-fencing daemon.
pub trait FenceControl: Send + Sync {
    /// Start fencing. Returns the daemon's raw exit code; interpretation
    /// lives in `failover::fencing`.
    fn start(&self, force: bool) -> CallResult<i32>;

    /// Stop fencing, releasing any reservation this node holds.
    fn stop(&self) -> CallResult<()>;
}

/// Remote calls to the peer controller.
pub trait PeerClient: Send + Sync {
    /// Whether the peer link is currently connected. Cheap; checked before
    /// any remote call on the hot path.
    fn is_connected(&self) -> bool;

    /// The peer's failover status.
    fn status(&self) -> CallResult<PeerStatus>;

    /// Ask the peer to push its current encryption keys to this node.
    fn request_key_sync(&self) -> CallResult<()>;
}

/// VRRP interface state, local and on the peer.
pub trait VipMonitor: Send + Sync {
    /// For the failover group containing `interface`, report which sibling
    /// interfaces the peer still holds as MASTER and which as BACKUP.
    fn group_state(
        &self,
        interface: &str,
        groups: &BTreeMap<u32, Vec<String>>,
    ) -> CallResult<GroupState>;

    /// Local interfaces currently holding a VRRP MASTER state.
    fn master_interfaces(&self) -> CallResult<Vec<String>>;
}

/// Regeneration of subsystem configuration files.
pub trait ConfigRegenerator: Send + Sync {
    /// Regenerate and apply configuration for the named subsystem.
    fn generate(&self, subsystem: &str) -> CallResult<()>;
}

/// Disk inventory and enclosure synchronization.
pub trait HardwareSync: Send + Sync {
    fn sync_disks(&self) -> CallResult<()>;
    fn sync_enclosure(&self) -> CallResult<()>;
}

/// Alert subsystem control.
pub trait AlertControl: Send + Sync {
    /// Suppress failover-induced alerts for the settling window.
    fn block_failover_alerts(&self) -> CallResult<()>;

    /// Re-arm the alert subsystem.
    fn initialize(&self, load_existing: bool) -> CallResult<()>;
}

/// External key-management (KMIP) integration.
pub trait KeyServer: Send + Sync {
    fn config(&self) -> CallResult<KeyServerConfig>;

    /// Resynchronize encryption keys from the key server.
    fn resync_keys(&self) -> CallResult<()>;
}

/// Direct reads of cluster configuration state.
///
/// Queried directly rather than through the probing service layer because
/// failover needs to be as fast as possible.
pub trait ClusterDb: Send + Sync {
    fn services(&self) -> CallResult<Vec<ServiceEntry>>;
    fn ha_config(&self) -> CallResult<HaConfig>;
    fn interfaces(&self) -> CallResult<Vec<InterfaceEntry>>;
}

/// Cached failover-status refresh.
pub trait ClusterStatus: Send + Sync {
    fn refresh(&self) -> CallResult<()>;
}

/// Outbound notification sink for UI/telemetry observers.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &RoleChanged) -> CallResult<()>;
}

/// The full set of collaborators the failover core needs.
///
/// Cloning is cheap; each slot is an `Arc`.
#[derive(Clone)]
pub struct Collaborators {
    pub pools: Arc<dyn PoolManager>,
    pub services: Arc<dyn ServiceManager>,
    pub fence: Arc<dyn FenceControl>,
    pub peer: Arc<dyn PeerClient>,
    pub vip: Arc<dyn VipMonitor>,
    pub etc: Arc<dyn ConfigRegenerator>,
    pub hardware: Arc<dyn HardwareSync>,
    pub alerts: Arc<dyn AlertControl>,
    pub keys: Arc<dyn KeyServer>,
    pub db: Arc<dyn ClusterDb>,
    pub status: Arc<dyn ClusterStatus>,
    pub sink: Arc<dyn EventSink>,
}
