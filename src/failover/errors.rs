//! Transition outcomes and failure detail
//!
//! The failover core never signals "skip" or "fail" through error types.
//! Every attempt ends in a [`TransitionOutcome`] the dispatcher consumes
//! explicitly; the only `Err` values inside the core are collaborator
//! [`CallError`](crate::cluster::CallError)s, handled at each call site.

use crate::failover::fencing::FenceResult;

/// Why an event was skipped without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Failover is disabled and this node is not the designated master.
    HaDisabledNotMaster,
    /// The affected interface is not failover-critical.
    NonCriticalInterface,
    /// The peer controller already reports itself MASTER.
    PeerAlreadyMaster,
    /// A MASTER transition is already being processed.
    MasterTransitionRunning,
    /// A BACKUP transition is already being processed.
    BackupTransitionRunning,
    /// Sibling interfaces in the failover group are still BACKUP on the
    /// peer; the MASTER event is stale.
    StaleMasterEvent,
    /// Sibling interfaces in the failover group are still MASTER on the
    /// peer; the BACKUP event is stale.
    StaleBackupEvent,
}

impl IgnoreReason {
    /// Operator-facing description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::HaDisabledNotMaster => {
                "failover is disabled and this node is marked BACKUP; assuming BACKUP"
            }
            Self::NonCriticalInterface => "state change on a non-critical interface",
            Self::PeerAlreadyMaster => "other node is already MASTER; assuming BACKUP",
            Self::MasterTransitionRunning => "a MASTER failover event is already being processed",
            Self::BackupTransitionRunning => "a BACKUP failover event is already being processed",
            Self::StaleMasterEvent => {
                "other interfaces in the failover group are still BACKUP on the peer"
            }
            Self::StaleBackupEvent => {
                "other interfaces in the failover group are still MASTER on the peer"
            }
        }
    }
}

/// One volume that failed to import, with enough context to diagnose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub volume: String,
    pub guid: String,
    pub error: String,
}

/// Why a transition aborted with no (or incomplete) role change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReason {
    /// The cluster snapshot could not be built; nothing was attempted.
    SnapshotUnavailable(String),
    /// Fencing returned a non-OK result; storage was never touched.
    Fencing(FenceResult),
    /// Every volume failed to import; nothing is going to work.
    AllImportsFailed(Vec<ImportFailure>),
    /// The export deadline elapsed; the reboot trigger has been invoked.
    ExportDeadline,
    /// Scheduling or joining the transition itself failed.
    Internal(String),
}

/// Terminal result class of one attempt, as reported to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Success,
    Ignored,
    Error,
}

impl TransitionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Ignored => "IGNORED",
            Self::Error => "ERROR",
        }
    }
}

/// Terminal outcome of one failover attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The event was deliberately skipped. Side-effect-free apart from the
    /// unconditional intake notification.
    Ignored(IgnoreReason),
    /// The transition completed with no failures.
    Success,
    /// Some volumes failed to import but the transition continued; partial
    /// availability is preferable to none.
    PartialFailure(Vec<ImportFailure>),
    /// The transition aborted.
    Fatal(FatalReason),
}

impl TransitionOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }

    /// Whether the transition ran to completion (possibly with partial
    /// import failures).
    pub fn completed(&self) -> bool {
        matches!(self, Self::Success | Self::PartialFailure(_))
    }

    /// The operator-facing result class. Partial failures report ERROR
    /// even though the transition continued.
    pub fn result(&self) -> TransitionResult {
        match self {
            Self::Ignored(_) => TransitionResult::Ignored,
            Self::Success => TransitionResult::Success,
            Self::PartialFailure(_) | Self::Fatal(_) => TransitionResult::Error,
        }
    }
}
