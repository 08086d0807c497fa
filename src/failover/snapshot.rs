//! Cluster snapshot
//!
//! One consistent read of cluster configuration and pool state, taken at
//! the start of a failover attempt and never refreshed. Every decision in
//! the attempt is made against this snapshot; concurrent configuration
//! changes take effect on the next event, not mid-transition.

use std::collections::{BTreeMap, BTreeSet};

use crate::cluster::{CallResult, Collaborators, HaConfig, ServiceEntry, VolumeEntry};

/// Immutable view of the cluster taken once per failover attempt.
#[derive(Debug, Clone)]
pub struct ClusterSnapshot {
    /// All configured volumes with their current status.
    pub volumes: Vec<VolumeEntry>,
    /// All configured services.
    pub services: Vec<ServiceEntry>,
    /// Critical interfaces grouped by failover group.
    pub groups: BTreeMap<u32, Vec<String>>,
    /// Names of non-critical interfaces.
    pub non_critical: BTreeSet<String>,
    /// HA configuration at snapshot time.
    pub ha: HaConfig,
}

impl ClusterSnapshot {
    /// Take one snapshot through the collaborators. Any failed read makes
    /// the whole snapshot unavailable; a failover attempt never runs on
    /// partial configuration.
    pub fn build(collab: &Collaborators) -> CallResult<Self> {
        let volumes = collab.pools.query()?;
        let services = collab.db.services()?;
        let ha = collab.db.ha_config()?;
        let interfaces = collab.db.interfaces()?;

        let mut groups: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        let mut non_critical = BTreeSet::new();
        for iface in interfaces {
            if iface.critical {
                groups
                    .entry(iface.failover_group)
                    .or_default()
                    .push(iface.name);
            } else {
                non_critical.insert(iface.name);
            }
        }

        Ok(Self {
            volumes,
            services,
            groups,
            non_critical,
            ha,
        })
    }

    /// Whether any volume needs the import path. A degraded or offline
    /// pool counts; only fully online pools are considered settled.
    pub fn needs_import(&self) -> bool {
        self.volumes.iter().any(|v| !v.status.is_online())
    }

    /// Whether `interface` belongs to a non-critical interface. VRRP
    /// instance names embed the interface name (e.g. `em0_v4`), so this
    /// is a containment check rather than equality.
    pub fn is_non_critical(&self, interface: &str) -> bool {
        self.non_critical
            .iter()
            .any(|name| interface.contains(name.as_str()))
    }

    /// Whether the named service is configured and enabled.
    pub fn service_enabled(&self, name: &str) -> bool {
        self.services
            .iter()
            .any(|s| s.name == name && s.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testkit::MockCluster;
    use crate::cluster::{PoolStatus, VolumeEntry};
    use std::sync::Arc;

    fn non_critical_interface(name: &str) -> crate::cluster::InterfaceEntry {
        crate::cluster::InterfaceEntry {
            name: name.to_string(),
            critical: false,
            failover_group: 0,
            has_vip: false,
        }
    }

    #[test]
    fn groups_critical_interfaces_by_failover_group() {
        let mut mock = MockCluster::new();
        mock.interface_table = vec![
            MockCluster::critical_interface("em0"),
            MockCluster::critical_interface("em1"),
            {
                let mut iface = MockCluster::critical_interface("igb0");
                iface.failover_group = 2;
                iface
            },
            non_critical_interface("mgmt0"),
        ];
        let mock = Arc::new(mock);

        let snapshot = ClusterSnapshot::build(&mock.collaborators()).unwrap();
        assert_eq!(snapshot.groups[&1], vec!["em0".to_string(), "em1".to_string()]);
        assert_eq!(snapshot.groups[&2], vec!["igb0".to_string()]);
        assert!(snapshot.non_critical.contains("mgmt0"));
    }

    #[test]
    fn non_critical_check_matches_instance_names() {
        let mut mock = MockCluster::new();
        mock.interface_table = vec![non_critical_interface("mgmt0")];
        let mock = Arc::new(mock);

        let snapshot = ClusterSnapshot::build(&mock.collaborators()).unwrap();
        assert!(snapshot.is_non_critical("mgmt0_v4"));
        assert!(!snapshot.is_non_critical("em0_v4"));
    }

    #[test]
    fn degraded_pool_needs_import() {
        let mut mock = MockCluster::new();
        mock.volumes = vec![VolumeEntry::new("tank", "g1", PoolStatus::Online)];
        let snapshot = ClusterSnapshot::build(&Arc::new(mock).collaborators()).unwrap();
        assert!(!snapshot.needs_import());

        let mut mock = MockCluster::new();
        mock.volumes = vec![
            VolumeEntry::new("tank", "g1", PoolStatus::Online),
            VolumeEntry::new("dozer", "g2", PoolStatus::Degraded),
        ];
        let snapshot = ClusterSnapshot::build(&Arc::new(mock).collaborators()).unwrap();
        assert!(snapshot.needs_import());
    }
}
