//! In-memory collaborators for tests
//!
//! [`MockCluster`] implements every collaborator trait, records each call in
//! order, and exposes knobs for the failure modes the failover core has to
//! survive: fencing exit codes, per-volume import failures, stuck exports,
//! an unreachable or already-MASTER peer.
//!
//! Configure the public fields before wrapping in `Arc`; afterwards only the
//! call log and the export hook are touched.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    AlertControl, CallError, CallResult, ClusterDb, ClusterStatus, Collaborators,
    ConfigRegenerator, EventSink, FenceControl, GroupState, HaConfig, HardwareSync,
    ImportOptions, InterfaceEntry, KeyServer, KeyServerConfig, PeerClient, PeerStatus,
    PoolManager, RoleChanged, ServiceEntry, ServiceManager, UnlockReport, VipMonitor,
    VolumeEntry,
};

type ExportHook = Box<dyn Fn(&str) + Send + Sync>;

/// Recording test double for the whole collaborator surface.
pub struct MockCluster {
    calls: Mutex<Vec<String>>,

    // Snapshot inputs
    pub volumes: Vec<VolumeEntry>,
    pub service_table: Vec<ServiceEntry>,
    pub interface_table: Vec<InterfaceEntry>,
    pub ha: HaConfig,

    // Peer behavior
    pub peer_connected: bool,
    pub peer_status: PeerStatus,
    pub group_state: GroupState,

    // Fencing behavior
    pub fence_code: i32,

    // Storage behavior
    /// Guids whose import fails.
    pub failing_imports: Vec<String>,
    /// Pool names whose export fails.
    pub failing_exports: Vec<String>,
    /// Delay applied before each export returns. Used to simulate a stuck
    /// export without a real storage engine.
    pub export_delay: Duration,
    /// Datasets reported as failed by `unlock_datasets`.
    pub unlock_failures: Vec<String>,

    pub key_server_enabled: bool,

    /// Invoked with the pool name at the start of each export. Lets tests
    /// observe on-disk state (e.g. the watchdog sentinel) mid-export.
    pub export_hook: Mutex<Option<ExportHook>>,
}

impl Default for MockCluster {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            volumes: Vec::new(),
            service_table: Vec::new(),
            interface_table: Vec::new(),
            ha: HaConfig {
                disabled: false,
                master: true,
                timeout: Duration::from_secs(2),
            },
            peer_connected: false,
            peer_status: PeerStatus::Backup,
            group_state: GroupState::default(),
            fence_code: 0,
            failing_imports: Vec::new(),
            failing_exports: Vec::new(),
            export_delay: Duration::ZERO,
            unlock_failures: Vec::new(),
            key_server_enabled: false,
            export_hook: Mutex::new(None),
        }
    }
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// A critical interface in group 1, the common single-NIC setup.
    pub fn critical_interface(name: &str) -> InterfaceEntry {
        InterfaceEntry {
            name: name.to_string(),
            critical: true,
            failover_group: 1,
            has_vip: true,
        }
    }

    /// Wire every collaborator slot to this mock.
    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            pools: Arc::clone(self) as Arc<dyn PoolManager>,
            services: Arc::clone(self) as Arc<dyn ServiceManager>,
            fence: Arc::clone(self) as Arc<dyn FenceControl>,
            peer: Arc::clone(self) as Arc<dyn PeerClient>,
            vip: Arc::clone(self) as Arc<dyn VipMonitor>,
            etc: Arc::clone(self) as Arc<dyn ConfigRegenerator>,
            hardware: Arc::clone(self) as Arc<dyn HardwareSync>,
            alerts: Arc::clone(self) as Arc<dyn AlertControl>,
            keys: Arc::clone(self) as Arc<dyn KeyServer>,
            db: Arc::clone(self) as Arc<dyn ClusterDb>,
            status: Arc::clone(self) as Arc<dyn ClusterStatus>,
            sink: Arc::clone(self) as Arc<dyn EventSink>,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// The ordered call log.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether any recorded call starts with `prefix`.
    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Index of the first recorded call starting with `prefix`.
    pub fn first_index(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }
}

impl PoolManager for MockCluster {
    fn query(&self) -> CallResult<Vec<VolumeEntry>> {
        self.record("pool.query".to_string());
        Ok(self.volumes.clone())
    }

    fn import(&self, guid: &str, _options: &ImportOptions) -> CallResult<()> {
        self.record(format!("pool.import {}", guid));
        if self.failing_imports.iter().any(|g| g == guid) {
            return Err(CallError::new("pool.import", format!("cannot import {}", guid)));
        }
        Ok(())
    }

    fn export(&self, name: &str, force: bool) -> CallResult<()> {
        self.record(format!("pool.export {} force={}", name, force));
        if let Some(hook) = self.export_hook.lock().unwrap().as_ref() {
            hook(name);
        }
        if !self.export_delay.is_zero() {
            std::thread::sleep(self.export_delay);
        }
        if self.failing_exports.iter().any(|n| n == name) {
            return Err(CallError::new("pool.export", format!("cannot export {}", name)));
        }
        Ok(())
    }

    fn unlock_datasets(&self, pool: &str) -> CallResult<UnlockReport> {
        self.record(format!("pool.unlock {}", pool));
        Ok(UnlockReport {
            failed: self.unlock_failures.clone(),
        })
    }
}

impl ServiceManager for MockCluster {
    fn restart(&self, name: &str, propagate_to_peer: bool) -> CallResult<()> {
        self.record(format!("service.restart {} propagate={}", name, propagate_to_peer));
        Ok(())
    }

    fn stop(&self, name: &str, propagate_to_peer: bool) -> CallResult<()> {
        self.record(format!("service.stop {} propagate={}", name, propagate_to_peer));
        Ok(())
    }
}

impl FenceControl for MockCluster {
    fn start(&self, force: bool) -> CallResult<i32> {
        self.record(format!("fenced.start force={}", force));
        Ok(self.fence_code)
    }

    fn stop(&self) -> CallResult<()> {
        self.record("fenced.stop".to_string());
        Ok(())
    }
}

impl PeerClient for MockCluster {
    fn is_connected(&self) -> bool {
        self.peer_connected
    }

    fn status(&self) -> CallResult<PeerStatus> {
        self.record("peer.status".to_string());
        Ok(self.peer_status)
    }

    fn request_key_sync(&self) -> CallResult<()> {
        self.record("peer.sync_keys".to_string());
        Ok(())
    }
}

impl VipMonitor for MockCluster {
    fn group_state(
        &self,
        interface: &str,
        _groups: &BTreeMap<u32, Vec<String>>,
    ) -> CallResult<GroupState> {
        self.record(format!("vip.group_state {}", interface));
        Ok(self.group_state.clone())
    }

    fn master_interfaces(&self) -> CallResult<Vec<String>> {
        self.record("vip.master_interfaces".to_string());
        Ok(self
            .interface_table
            .iter()
            .filter(|i| i.has_vip)
            .map(|i| i.name.clone())
            .collect())
    }
}

impl ConfigRegenerator for MockCluster {
    fn generate(&self, subsystem: &str) -> CallResult<()> {
        self.record(format!("etc.generate {}", subsystem));
        Ok(())
    }
}

impl HardwareSync for MockCluster {
    fn sync_disks(&self) -> CallResult<()> {
        self.record("disk.sync_all".to_string());
        Ok(())
    }

    fn sync_enclosure(&self) -> CallResult<()> {
        self.record("enclosure.sync".to_string());
        Ok(())
    }
}

impl AlertControl for MockCluster {
    fn block_failover_alerts(&self) -> CallResult<()> {
        self.record("alert.block_failover_alerts".to_string());
        Ok(())
    }

    fn initialize(&self, load_existing: bool) -> CallResult<()> {
        self.record(format!("alert.initialize load_existing={}", load_existing));
        Ok(())
    }
}

impl KeyServer for MockCluster {
    fn config(&self) -> CallResult<KeyServerConfig> {
        self.record("kmip.config".to_string());
        Ok(KeyServerConfig {
            enabled: self.key_server_enabled,
        })
    }

    fn resync_keys(&self) -> CallResult<()> {
        self.record("kmip.resync_keys".to_string());
        Ok(())
    }
}

impl ClusterDb for MockCluster {
    fn services(&self) -> CallResult<Vec<ServiceEntry>> {
        self.record("db.services".to_string());
        Ok(self.service_table.clone())
    }

    fn ha_config(&self) -> CallResult<HaConfig> {
        self.record("db.ha_config".to_string());
        Ok(self.ha.clone())
    }

    fn interfaces(&self) -> CallResult<Vec<InterfaceEntry>> {
        self.record("db.interfaces".to_string());
        Ok(self.interface_table.clone())
    }
}

impl ClusterStatus for MockCluster {
    fn refresh(&self) -> CallResult<()> {
        self.record("status.refresh".to_string());
        Ok(())
    }
}

impl EventSink for MockCluster {
    fn publish(&self, event: &RoleChanged) -> CallResult<()> {
        self.record(format!("event.publish {} {}", event.interface, event.role));
        Ok(())
    }
}
