//! Persistent on-disk markers
//!
//! Two small files carry failover state across process and node restarts:
//!
//! - the pool-cache killcache marker, which tells the next boot not to
//!   trust the persisted pool cache after an unclean role change, and
//! - the watchdog sentinel, which tells the unscheduled-reboot monitor
//!   that a reboot during export was deliberate.
//!
//! Both are written durably (flush + fsync) before the caller resumes; a
//! marker that exists only in the page cache protects nothing.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::FailoverConfig;
use crate::observability::{Event, Logger};

/// Pool-cache bookkeeping run at the start of a MASTER transition.
pub struct CacheBookkeeping {
    killcache: PathBuf,
    cache: PathBuf,
    saved: PathBuf,
}

impl CacheBookkeeping {
    pub fn new(config: &FailoverConfig) -> Self {
        Self {
            killcache: config.killcache_path.clone(),
            cache: config.pool_cache_path.clone(),
            saved: config.saved_pool_cache_path.clone(),
        }
    }

    /// Run the bookkeeping. Wholly best-effort: cache state only affects
    /// how fast the next boot imports, never whether this transition can
    /// proceed.
    pub fn apply(&self) {
        if self.killcache.exists() {
            let _ = fs::remove_file(&self.cache);
            let _ = fs::remove_file(&self.saved);
        } else if let Err(e) = self.write_killcache() {
            Logger::warn(
                Event::CacheBookkeeping.name(),
                &[("error", &e.to_string()), ("marker", "killcache")],
            );
        }

        // Keep the saved copy current if the live cache has moved past it.
        if self.cache.exists() && self.saved.exists() {
            if let (Ok(cache_meta), Ok(saved_meta)) =
                (fs::metadata(&self.cache), fs::metadata(&self.saved))
            {
                if let (Ok(cache_mtime), Ok(saved_mtime)) =
                    (cache_meta.modified(), saved_meta.modified())
                {
                    if cache_mtime > saved_mtime {
                        let _ = fs::copy(&self.cache, &self.saved);
                    }
                }
            }
        }

        Logger::info(Event::CacheBookkeeping.name(), &[]);
    }

    fn write_killcache(&self) -> io::Result<()> {
        if let Some(parent) = self.killcache.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&self.killcache)?;
        file.flush()?;
        file.sync_all()
    }
}

/// Contents of the watchdog sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelPayload {
    /// Unix timestamp of when the sentinel was armed.
    pub armed_at: i64,
}

/// Sentinel armed before pool export and removed only after a clean one.
///
/// If the export deadline reboots the node, the sentinel survives and the
/// reboot monitor reports a planned failover reboot instead of a crash.
pub struct WatchdogSentinel {
    path: PathBuf,
}

impl WatchdogSentinel {
    pub fn new(config: &FailoverConfig) -> Self {
        Self {
            path: config.watchdog_sentinel_path.clone(),
        }
    }

    /// Write the sentinel durably.
    pub fn arm(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = SentinelPayload {
            armed_at: Utc::now().timestamp(),
        };
        let body = serde_json::to_string(&payload)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let mut file = File::create(&self.path)?;
        file.write_all(body.as_bytes())?;
        file.flush()?;
        file.sync_all()?;

        Logger::info(Event::WatchdogSentinelArmed.name(), &[]);
        Ok(())
    }

    /// Remove the sentinel after a clean export. Best-effort; a leftover
    /// sentinel costs one spurious reboot-cause report, not correctness.
    pub fn disarm(&self) {
        if fs::remove_file(&self.path).is_ok() {
            Logger::info(Event::WatchdogSentinelDisarmed.name(), &[]);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.path.exists()
    }

    /// Read back the payload, if the sentinel exists and parses.
    pub fn read(&self) -> Option<SentinelPayload> {
        let body = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> FailoverConfig {
        FailoverConfig::rooted_at(dir)
    }

    #[test]
    fn first_run_writes_the_killcache_marker() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        CacheBookkeeping::new(&config).apply();
        assert!(config.killcache_path.exists());
    }

    #[test]
    fn existing_marker_removes_both_caches() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(config.killcache_path.parent().unwrap()).unwrap();
        fs::write(&config.killcache_path, "").unwrap();
        fs::write(&config.pool_cache_path, "cache").unwrap();
        fs::write(&config.saved_pool_cache_path, "saved").unwrap();

        CacheBookkeeping::new(&config).apply();
        assert!(!config.pool_cache_path.exists());
        assert!(!config.saved_pool_cache_path.exists());
        // The marker itself stays until the boot path consumes it.
        assert!(config.killcache_path.exists());
    }

    #[test]
    fn sentinel_arms_and_disarms() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let sentinel = WatchdogSentinel::new(&config);

        assert!(!sentinel.is_armed());
        sentinel.arm().unwrap();
        assert!(sentinel.is_armed());

        let payload = sentinel.read().unwrap();
        assert!(payload.armed_at > 0);

        sentinel.disarm();
        assert!(!sentinel.is_armed());
    }

    #[test]
    fn disarm_without_sentinel_is_harmless() {
        let dir = TempDir::new().unwrap();
        let sentinel = WatchdogSentinel::new(&config_in(dir.path()));
        sentinel.disarm();
        assert!(!sentinel.is_armed());
    }
}
