//! Transition phase tracking
//!
//! Phases are explicit and enumerable; a transition moves
//! `Received → Electing → (Importing | Exporting) → Done`, or drops out to
//! `Ignored`/`Failed`. The current phase is published through the job
//! registry so a concurrent event (and the local status probe) can see what
//! stage an in-flight transition has reached.
//!
//! "Electing" is reported even though the election already happened at the
//! VRRP layer: by the time a transition runs, the advertisement timeout has
//! elapsed. The term is kept for operator-surface compatibility.

/// Phase of one failover transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Event accepted, transition not yet started.
    Received,
    /// Fencing / peer checks in progress.
    Electing,
    /// Pool imports in progress (MASTER path).
    Importing,
    /// Pool exports in progress under the deadline (BACKUP path).
    Exporting,
    /// Terminal: transition ran to completion.
    Done,
    /// Terminal: event deliberately skipped.
    Ignored,
    /// Terminal: transition aborted.
    Failed,
}

impl TransitionPhase {
    /// Phase name as reported in progress descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Electing => "ELECTING",
            Self::Importing => "IMPORTING",
            Self::Exporting => "EXPORTING",
            Self::Done => "DONE",
            Self::Ignored => "IGNORED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether this phase ends the transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Ignored | Self::Failed)
    }

    /// Whether `next` is a legal successor of this phase.
    pub fn allows(&self, next: TransitionPhase) -> bool {
        match (self, next) {
            (Self::Received, Self::Electing) => true,
            (Self::Electing, Self::Importing) => true,
            (Self::Electing, Self::Exporting) => true,
            (Self::Importing, Self::Done) => true,
            (Self::Exporting, Self::Done) => true,
            // Electing can complete directly when a transition has no
            // storage work (BACKUP with zero volumes).
            (Self::Electing, Self::Done) => true,
            // An ignore decision is only reachable before storage is touched.
            (Self::Received, Self::Ignored) => true,
            (Self::Electing, Self::Ignored) => true,
            // Any non-terminal phase can fail.
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_master() {
        assert!(TransitionPhase::Received.allows(TransitionPhase::Electing));
        assert!(TransitionPhase::Electing.allows(TransitionPhase::Importing));
        assert!(TransitionPhase::Importing.allows(TransitionPhase::Done));
    }

    #[test]
    fn happy_path_backup() {
        assert!(TransitionPhase::Electing.allows(TransitionPhase::Exporting));
        assert!(TransitionPhase::Exporting.allows(TransitionPhase::Done));
    }

    #[test]
    fn ignore_only_before_storage_is_touched() {
        assert!(TransitionPhase::Received.allows(TransitionPhase::Ignored));
        assert!(TransitionPhase::Electing.allows(TransitionPhase::Ignored));
        assert!(!TransitionPhase::Importing.allows(TransitionPhase::Ignored));
        assert!(!TransitionPhase::Exporting.allows(TransitionPhase::Ignored));
    }

    #[test]
    fn terminal_phases_allow_nothing() {
        for terminal in [
            TransitionPhase::Done,
            TransitionPhase::Ignored,
            TransitionPhase::Failed,
        ] {
            for next in [
                TransitionPhase::Received,
                TransitionPhase::Electing,
                TransitionPhase::Importing,
                TransitionPhase::Exporting,
                TransitionPhase::Done,
                TransitionPhase::Ignored,
                TransitionPhase::Failed,
            ] {
                assert!(!terminal.allows(next), "{:?} -> {:?}", terminal, next);
            }
        }
    }

    #[test]
    fn importing_cannot_jump_to_exporting() {
        assert!(!TransitionPhase::Importing.allows(TransitionPhase::Exporting));
        assert!(!TransitionPhase::Exporting.allows(TransitionPhase::Importing));
    }

    #[test]
    fn names_match_progress_descriptions() {
        assert_eq!(TransitionPhase::Electing.name(), "ELECTING");
        assert_eq!(TransitionPhase::Importing.name(), "IMPORTING");
        assert_eq!(TransitionPhase::Exporting.name(), "EXPORTING");
    }
}
