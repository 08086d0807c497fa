//! Failover orchestrator
//!
//! Owns the job registry and the dispatch path from a validated role
//! event to a running transition. Transitions execute on dedicated named
//! threads and are joined synchronously; the caller of `handle_event`
//! gets the terminal outcome, not a job id.

use std::sync::{Arc, Mutex};
use std::thread;

use crate::cluster::{best_effort, Collaborators, PeerStatus};
use crate::config::FailoverConfig;
use crate::observability::{Event, Logger};

use super::errors::{FatalReason, IgnoreReason, TransitionOutcome};
use super::event::{RoleEvent, RoleKind};
use super::jobs::{JobRegistry, BECOME_BACKUP, BECOME_MASTER};
use super::snapshot::ClusterSnapshot;
use super::transition::{BackupTransition, MasterTransition};
use super::validator::EventValidator;

/// Which direction a completed transition moved the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRole {
    Master,
    Backup,
}

impl TransitionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "MASTER",
            Self::Backup => "BACKUP",
        }
    }
}

/// Whether a transition has ever completed on this node, and which one
/// did so last. Set on completion, never reset; "a failover has happened"
/// is a fact about the process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastOutcome {
    pub completed: bool,
    pub role: Option<TransitionRole>,
}

pub struct FailoverOrchestrator {
    collab: Collaborators,
    config: FailoverConfig,
    registry: Arc<JobRegistry>,
    last: Mutex<LastOutcome>,
}

impl FailoverOrchestrator {
    pub fn new(collab: Collaborators, config: FailoverConfig) -> Self {
        Self {
            collab,
            config,
            registry: Arc::new(JobRegistry::new()),
            last: Mutex::new(LastOutcome::default()),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    /// The last completed transition, if any.
    pub fn last_outcome(&self) -> LastOutcome {
        *self.last.lock().unwrap()
    }

    /// Handle one role event end to end.
    pub fn handle_event(&self, event: RoleEvent) -> TransitionOutcome {
        Logger::info(
            Event::RoleEventReceived.name(),
            &[
                ("interface", event.interface.as_str()),
                ("kind", event.kind.name()),
            ],
        );

        let outcome = self.dispatch(&event);

        if let TransitionOutcome::Ignored(reason) = &outcome {
            Logger::warn(
                Event::RoleEventIgnored.name(),
                &[
                    ("interface", event.interface.as_str()),
                    ("reason", reason.description()),
                ],
            );
        } else {
            // Keep the cached status current after any attempt that got
            // past validation, successful or not.
            best_effort(self.collab.status.refresh());
        }
        outcome
    }

    /// Operator-initiated takeover of `interface`.
    pub fn force_takeover(&self, interface: &str) -> TransitionOutcome {
        self.handle_event(RoleEvent {
            interface: interface.to_string(),
            kind: RoleKind::ForceTakeover,
        })
    }

    fn dispatch(&self, event: &RoleEvent) -> TransitionOutcome {
        let forcetakeover = event.kind == RoleKind::ForceTakeover;

        let snapshot = match ClusterSnapshot::build(&self.collab) {
            Ok(snapshot) => snapshot,
            Err(e) => return TransitionOutcome::Fatal(FatalReason::SnapshotUnavailable(e.to_string())),
        };

        if !forcetakeover {
            if snapshot.ha.disabled && !snapshot.ha.master {
                return TransitionOutcome::Ignored(IgnoreReason::HaDisabledNotMaster);
            }
            if snapshot.is_non_critical(&event.interface) {
                return TransitionOutcome::Ignored(IgnoreReason::NonCriticalInterface);
            }
            if self.collab.peer.is_connected() {
                if let Some(PeerStatus::Master) = best_effort(self.collab.peer.status()) {
                    return TransitionOutcome::Ignored(IgnoreReason::PeerAlreadyMaster);
                }
            }
            if !snapshot.needs_import() {
                // Every pool is already imported here; nothing to take
                // over. The last-outcome flag is left alone.
                Logger::warn(
                    Event::RoleEventReceived.name(),
                    &[
                        ("interface", event.interface.as_str()),
                        ("note", "all pools already imported; nothing to do"),
                    ],
                );
                return TransitionOutcome::Success;
            }
        }

        // Pools need importing on this node, so regardless of what the
        // link layer said, the direction is MASTER, with fencing forced
        // past any reservation the peer left behind.
        if let Err(reason) = EventValidator::validate(&self.registry, &event.interface, event.kind)
        {
            return TransitionOutcome::Ignored(reason);
        }

        self.become_master(snapshot, &event.interface, true, forcetakeover)
    }

    /// Run a MASTER transition under the `become-master` lock.
    pub fn become_master(
        &self,
        snapshot: ClusterSnapshot,
        interface: &str,
        force_fenced: bool,
        forcetakeover: bool,
    ) -> TransitionOutcome {
        let job = match self.registry.try_acquire(BECOME_MASTER) {
            Some(job) => job,
            None => return TransitionOutcome::Ignored(IgnoreReason::MasterTransitionRunning),
        };
        let transition = MasterTransition::new(
            self.collab.clone(),
            self.config.clone(),
            snapshot,
            interface.to_string(),
            force_fenced,
            forcetakeover,
            job,
        );
        self.run_on_thread(BECOME_MASTER, TransitionRole::Master, move || {
            transition.run()
        })
    }

    /// Run a BACKUP transition under the `become-backup` lock.
    pub fn become_backup(&self, snapshot: ClusterSnapshot, interface: &str) -> TransitionOutcome {
        let job = match self.registry.try_acquire(BECOME_BACKUP) {
            Some(job) => job,
            None => return TransitionOutcome::Ignored(IgnoreReason::BackupTransitionRunning),
        };
        let transition = BackupTransition::new(
            self.collab.clone(),
            self.config.clone(),
            snapshot,
            interface.to_string(),
            job,
        );
        self.run_on_thread(BECOME_BACKUP, TransitionRole::Backup, move || {
            transition.run()
        })
    }

    fn run_on_thread<F>(&self, name: &str, role: TransitionRole, body: F) -> TransitionOutcome
    where
        F: FnOnce() -> TransitionOutcome + Send + 'static,
    {
        let spawned = thread::Builder::new().name(name.to_string()).spawn(body);
        let outcome = match spawned {
            Ok(handle) => handle.join().unwrap_or_else(|_| {
                TransitionOutcome::Fatal(FatalReason::Internal(format!(
                    "{} transition panicked",
                    role.as_str()
                )))
            }),
            Err(e) => TransitionOutcome::Fatal(FatalReason::Internal(format!(
                "failed to spawn {} transition: {}",
                role.as_str(),
                e
            ))),
        };

        if outcome.completed() {
            *self.last.lock().unwrap() = LastOutcome {
                completed: true,
                role: Some(role),
            };
        }
        outcome
    }
}
