//! Named-lock job registry
//!
//! Transitions run as independently schedulable units of work under named
//! locks. The registry answers two questions:
//!
//! 1. Is a transition with this lock name currently RUNNING? (asked by the
//!    validator before a new event proceeds)
//! 2. What phase has it reached? (asked by the local status probe)
//!
//! A second acquisition of the same name fails fast; it must never run
//! concurrently. The MASTER and BACKUP locks are distinct: the registry
//! does not serialize master-vs-backup; that exclusion belongs to the
//! peer checks, not to the lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::state::TransitionPhase;

/// Lock name for MASTER transitions.
pub const BECOME_MASTER: &str = "become-master";

/// Lock name for BACKUP transitions.
pub const BECOME_BACKUP: &str = "become-backup";

/// One in-flight transition as seen through the registry.
#[derive(Debug, Clone)]
pub struct RunningJob {
    pub id: Uuid,
    pub lock: &'static str,
    pub phase: TransitionPhase,
}

/// Registry of in-flight transitions.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, RunningJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All currently running jobs.
    pub fn running(&self) -> Vec<RunningJob> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }

    /// Whether a job holding `lock` is running.
    pub fn is_running(&self, lock: &str) -> bool {
        self.jobs.lock().unwrap().values().any(|j| j.lock == lock)
    }

    /// Phase of the running job holding `lock`, if any.
    pub fn running_phase(&self, lock: &str) -> Option<TransitionPhase> {
        self.jobs
            .lock()
            .unwrap()
            .values()
            .find(|j| j.lock == lock)
            .map(|j| j.phase)
    }

    /// Acquire the named lock, registering a new job in `Received` phase.
    /// Fails fast (returns `None`) if the lock is already held.
    pub fn try_acquire(self: &Arc<Self>, lock: &'static str) -> Option<JobHandle> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.values().any(|j| j.lock == lock) {
            return None;
        }
        let id = Uuid::new_v4();
        jobs.insert(
            id,
            RunningJob {
                id,
                lock,
                phase: TransitionPhase::Received,
            },
        );
        Some(JobHandle {
            registry: Arc::clone(self),
            id,
            lock,
        })
    }

    fn set_phase(&self, id: Uuid, phase: TransitionPhase) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&id) {
            // Illegal jumps are a programming error in the transition
            // body; keep the registry consistent rather than panic inside
            // a failover.
            if job.phase.allows(phase) {
                job.phase = phase;
            }
        }
    }

    fn finish(&self, id: Uuid) {
        self.jobs.lock().unwrap().remove(&id);
    }
}

/// Holder of a named transition lock. Dropping the handle releases the
/// lock and removes the job from the registry.
pub struct JobHandle {
    registry: Arc<JobRegistry>,
    pub id: Uuid,
    pub lock: &'static str,
}

impl JobHandle {
    /// Publish the phase this transition has reached.
    pub fn set_phase(&self, phase: TransitionPhase) {
        self.registry.set_phase(self.id, phase);
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.registry.finish(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_registers_a_running_job() {
        let registry = Arc::new(JobRegistry::new());
        assert!(!registry.is_running(BECOME_MASTER));

        let handle = registry.try_acquire(BECOME_MASTER).unwrap();
        assert!(registry.is_running(BECOME_MASTER));
        assert!(!registry.is_running(BECOME_BACKUP));
        assert_eq!(registry.running().len(), 1);
        drop(handle);
    }

    #[test]
    fn second_acquisition_of_same_name_fails_fast() {
        let registry = Arc::new(JobRegistry::new());
        let _held = registry.try_acquire(BECOME_MASTER).unwrap();
        assert!(registry.try_acquire(BECOME_MASTER).is_none());
    }

    #[test]
    fn master_and_backup_locks_are_distinct() {
        let registry = Arc::new(JobRegistry::new());
        let _master = registry.try_acquire(BECOME_MASTER).unwrap();
        assert!(registry.try_acquire(BECOME_BACKUP).is_some());
    }

    #[test]
    fn drop_releases_the_lock() {
        let registry = Arc::new(JobRegistry::new());
        let handle = registry.try_acquire(BECOME_BACKUP).unwrap();
        drop(handle);
        assert!(!registry.is_running(BECOME_BACKUP));
        assert!(registry.try_acquire(BECOME_BACKUP).is_some());
    }

    #[test]
    fn phase_updates_are_visible() {
        let registry = Arc::new(JobRegistry::new());
        let handle = registry.try_acquire(BECOME_MASTER).unwrap();

        handle.set_phase(TransitionPhase::Electing);
        assert_eq!(
            registry.running_phase(BECOME_MASTER),
            Some(TransitionPhase::Electing)
        );

        handle.set_phase(TransitionPhase::Importing);
        assert_eq!(
            registry.running_phase(BECOME_MASTER),
            Some(TransitionPhase::Importing)
        );
    }

    #[test]
    fn illegal_phase_jump_is_dropped() {
        let registry = Arc::new(JobRegistry::new());
        let handle = registry.try_acquire(BECOME_MASTER).unwrap();

        // Received -> Done is not a legal edge; phase stays put.
        handle.set_phase(TransitionPhase::Done);
        assert_eq!(
            registry.running_phase(BECOME_MASTER),
            Some(TransitionPhase::Received)
        );
    }
}
