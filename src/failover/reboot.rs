//! Hard reboot trigger
//!
//! Last resort of the BACKUP path: when pool export misses its deadline,
//! the node reboots through the kernel sysrq interface rather than keep
//! the disks in an ambiguous half-exported state while the peer imports
//! them. The write goes straight to the kernel; no service shutdown, no
//! filesystem sync.

use std::fs;
use std::path::PathBuf;

use crate::config::FailoverConfig;
use crate::observability::{Event, Logger};

pub struct RebootTrigger {
    enable_path: PathBuf,
    trigger_path: PathBuf,
}

impl RebootTrigger {
    pub fn new(config: &FailoverConfig) -> Self {
        Self {
            enable_path: config.sysrq_enable_path.clone(),
            trigger_path: config.sysrq_trigger_path.clone(),
        }
    }

    /// Enable sysrq and fire the reboot trigger. The log line is written
    /// first; after the trigger lands there is no process left to log.
    pub fn fire(&self) {
        Logger::fatal(Event::RebootTriggered.name(), &[("trigger", "sysrq-b")]);
        let _ = fs::write(&self.enable_path, "1");
        let _ = fs::write(&self.trigger_path, "b");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fire_writes_both_control_files() {
        let dir = TempDir::new().unwrap();
        let config = FailoverConfig::rooted_at(dir.path());
        let trigger = RebootTrigger::new(&config);

        trigger.fire();
        assert_eq!(fs::read_to_string(&config.sysrq_enable_path).unwrap(), "1");
        assert_eq!(fs::read_to_string(&config.sysrq_trigger_path).unwrap(), "b");
    }

    #[test]
    fn missing_control_files_do_not_panic() {
        let dir = TempDir::new().unwrap();
        let mut config = FailoverConfig::rooted_at(dir.path());
        config.sysrq_enable_path = dir.path().join("no/such/dir/sysrq");
        config.sysrq_trigger_path = dir.path().join("no/such/dir/sysrq-trigger");

        RebootTrigger::new(&config).fire();
    }
}
