//! Pre-transition event validation
//!
//! Gates an incoming role event on the job registry before any work is
//! scheduled. The only property enforced here is single-flight per
//! direction: a running MASTER transition rejects further MASTER (and
//! forced-takeover) events, a running BACKUP transition rejects further
//! BACKUP events. The opposite direction is intentionally NOT blocked;
//! the stale-group checks inside the transitions handle crossed events.

use super::errors::IgnoreReason;
use super::event::RoleKind;
use super::jobs::{JobRegistry, BECOME_BACKUP, BECOME_MASTER};

pub struct EventValidator;

impl EventValidator {
    /// Validate that `kind` may proceed given the current registry state.
    ///
    /// Note: suppression of rapid flapping (rejecting events that arrive
    /// within a short window of the previous one) is a known gap here;
    /// a repeated event in the opposite direction is admitted as soon as
    /// the prior transition finishes.
    pub fn validate(
        registry: &JobRegistry,
        _interface: &str,
        kind: RoleKind,
    ) -> Result<(), IgnoreReason> {
        match kind {
            RoleKind::Master | RoleKind::ForceTakeover => {
                if registry.is_running(BECOME_MASTER) {
                    return Err(IgnoreReason::MasterTransitionRunning);
                }
            }
            RoleKind::Backup => {
                if registry.is_running(BECOME_BACKUP) {
                    return Err(IgnoreReason::BackupTransitionRunning);
                }
            }
        }
        Ok(())
    }
}
