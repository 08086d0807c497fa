//! Failover configuration
//!
//! Fixed well-known paths and timing constants used by the failover core.
//! Configured at startup, immutable afterwards. Every path can be re-rooted
//! for tests; production uses the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Critical services restarted first, in this order, after becoming MASTER.
pub const CRITICAL_SERVICES: &[&str] = &["iscsitarget", "cifs", "nfs", "afp"];

/// Failover core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverConfig {
    /// Marker telling the next boot not to trust the persisted pool cache.
    pub killcache_path: PathBuf,

    /// Pool cache file managed by the storage engine.
    pub pool_cache_path: PathBuf,

    /// Copy of the pool cache saved by the pool subsystem during boot.
    pub saved_pool_cache_path: PathBuf,

    /// Sentinel read by the unscheduled-reboot monitor to tell a planned
    /// failover reboot apart from an unexplained crash.
    pub watchdog_sentinel_path: PathBuf,

    /// Altroot under which imported pools are mounted.
    pub altroot: PathBuf,

    /// Hard limit on exporting pools when becoming BACKUP. If exports do
    /// not finish inside this window the node reboots.
    pub export_timeout: Duration,

    /// How long the export worker stalls after an export error. Must exceed
    /// `export_timeout` so the deadline fires instead of racing a recovery
    /// path that cannot be trusted.
    pub export_stall: Duration,

    /// Kernel control file that enables sysrq triggers.
    pub sysrq_enable_path: PathBuf,

    /// Kernel control file that accepts the reboot trigger.
    pub sysrq_trigger_path: PathBuf,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            killcache_path: PathBuf::from("/data/zfs/killcache"),
            pool_cache_path: PathBuf::from("/data/zfs/zpool.cache"),
            saved_pool_cache_path: PathBuf::from("/data/zfs/zpool.cache.saved"),
            watchdog_sentinel_path: PathBuf::from("/data/sentinels/.watchdog-alert"),
            altroot: PathBuf::from("/mnt"),
            export_timeout: Duration::from_secs(4),
            export_stall: Duration::from_secs(5),
            sysrq_enable_path: PathBuf::from("/proc/sys/kernel/sysrq"),
            sysrq_trigger_path: PathBuf::from("/proc/sysrq-trigger"),
        }
    }
}

impl FailoverConfig {
    /// Re-root every filesystem path under `root`. Timing constants keep
    /// their defaults. Used by tests and by development deployments.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            killcache_path: root.join("zfs/killcache"),
            pool_cache_path: root.join("zfs/zpool.cache"),
            saved_pool_cache_path: root.join("zfs/zpool.cache.saved"),
            watchdog_sentinel_path: root.join("sentinels/.watchdog-alert"),
            altroot: root.join("mnt"),
            sysrq_enable_path: root.join("sysrq"),
            sysrq_trigger_path: root.join("sysrq-trigger"),
            ..Self::default()
        }
    }

    /// Override the export deadline.
    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }

    /// Override the post-error export stall.
    pub fn with_export_stall(mut self, stall: Duration) -> Self {
        self.export_stall = stall;
        self
    }
}
