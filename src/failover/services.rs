//! Service restart coordination
//!
//! Every restart and stop issued during a transition is local-only: the
//! peer runs its own transition and must never see this node's service
//! churn replayed onto it. Critical data-path services restart first, in
//! fixed order, before anything else is touched.

use std::sync::Arc;

use crate::cluster::{best_effort, ServiceEntry, ServiceManager};
use crate::config::CRITICAL_SERVICES;
use crate::observability::{Event, Logger};

pub struct ServiceRestartCoordinator {
    services: Arc<dyn ServiceManager>,
}

impl ServiceRestartCoordinator {
    pub fn new(services: Arc<dyn ServiceManager>) -> Self {
        Self { services }
    }

    /// Restart one service locally, best-effort.
    pub fn restart_local(&self, name: &str) {
        if best_effort(self.services.restart(name, false)).is_some() {
            Logger::info(Event::ServiceRestarted.name(), &[("service", name)]);
        }
    }

    /// Stop one service locally, best-effort.
    pub fn stop_local(&self, name: &str) {
        if best_effort(self.services.stop(name, false)).is_some() {
            Logger::info(Event::ServiceStopped.name(), &[("service", name)]);
        }
    }

    /// Restart the critical data-path services that are configured and
    /// enabled, in the fixed order clients tolerate best.
    pub fn restart_critical(&self, services: &[ServiceEntry]) {
        for name in CRITICAL_SERVICES {
            if services.iter().any(|s| s.name == *name && s.enabled) {
                self.restart_local(name);
            }
        }
    }

    /// Restart every enabled non-critical service.
    pub fn restart_remaining(&self, services: &[ServiceEntry]) {
        for service in services {
            if service.enabled && !CRITICAL_SERVICES.contains(&service.name.as_str()) {
                self.restart_local(&service.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testkit::MockCluster;

    fn coordinator(mock: &Arc<MockCluster>) -> ServiceRestartCoordinator {
        ServiceRestartCoordinator::new(Arc::clone(mock) as Arc<dyn ServiceManager>)
    }

    #[test]
    fn restarts_never_propagate_to_the_peer() {
        let mock = Arc::new(MockCluster::new());
        coordinator(&mock).restart_local("nfs");
        coordinator(&mock).stop_local("collectd");

        assert!(mock.called("service.restart nfs propagate=false"));
        assert!(mock.called("service.stop collectd propagate=false"));
        assert!(!mock.called("service.restart nfs propagate=true"));
    }

    #[test]
    fn critical_services_restart_in_fixed_order() {
        let mock = Arc::new(MockCluster::new());
        let table = vec![
            ServiceEntry::new("nfs", true),
            ServiceEntry::new("iscsitarget", true),
            ServiceEntry::new("cifs", true),
        ];

        coordinator(&mock).restart_critical(&table);

        let iscsi = mock.first_index("service.restart iscsitarget").unwrap();
        let cifs = mock.first_index("service.restart cifs").unwrap();
        let nfs = mock.first_index("service.restart nfs").unwrap();
        assert!(iscsi < cifs && cifs < nfs);
    }

    #[test]
    fn disabled_and_unconfigured_critical_services_are_skipped() {
        let mock = Arc::new(MockCluster::new());
        let table = vec![
            ServiceEntry::new("cifs", false),
            ServiceEntry::new("nfs", true),
        ];

        coordinator(&mock).restart_critical(&table);
        assert!(!mock.called("service.restart cifs"));
        assert!(!mock.called("service.restart iscsitarget"));
        assert!(mock.called("service.restart nfs"));
    }

    #[test]
    fn remaining_pass_skips_critical_and_disabled() {
        let mock = Arc::new(MockCluster::new());
        let table = vec![
            ServiceEntry::new("nfs", true),
            ServiceEntry::new("snmp", true),
            ServiceEntry::new("ftp", false),
        ];

        coordinator(&mock).restart_remaining(&table);
        assert!(mock.called("service.restart snmp"));
        assert!(!mock.called("service.restart nfs"));
        assert!(!mock.called("service.restart ftp"));
    }
}
