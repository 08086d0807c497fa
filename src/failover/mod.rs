//! Failover core
//!
//! Decides, on receipt of a link-layer election signal, whether this node
//! becomes MASTER or BACKUP, and drives the side effects that make the
//! change safe: disk fencing, pool import/export, service restarts, and the
//! watchdog reboot fail-safe.
//!
//! Design rules this module lives by:
//! - Only one MASTER and one BACKUP transition may be in flight at a time,
//!   enforced by named locks in the job registry and checked by the
//!   validator before a lock is ever attempted.
//! - A ClusterSnapshot is built once per attempt and never shared.
//! - "Skip this event" and "this attempt failed" are different outcomes,
//!   carried in [`TransitionOutcome`], never in error types.
//! - Releasing exclusive storage access is bounded by a hard deadline; if
//!   the deadline fires the node reboots rather than linger in an
//!   ambiguous state.

mod errors;
mod event;
mod fencing;
mod jobs;
mod markers;
mod orchestrator;
mod reboot;
mod services;
mod snapshot;
mod state;
mod status;
mod steps;
mod storage;
mod transition;
mod validator;

pub use errors::{FatalReason, IgnoreReason, ImportFailure, TransitionOutcome, TransitionResult};
pub use event::{parse_notification, EventIntake, RoleEvent, RoleKind};
pub use fencing::{FenceResult, FencingGate};
pub use jobs::{JobHandle, JobRegistry, RunningJob, BECOME_BACKUP, BECOME_MASTER};
pub use markers::{CacheBookkeeping, SentinelPayload, WatchdogSentinel};
pub use orchestrator::{FailoverOrchestrator, LastOutcome, TransitionRole};
pub use reboot::RebootTrigger;
pub use services::ServiceRestartCoordinator;
pub use snapshot::ClusterSnapshot;
pub use state::TransitionPhase;
pub use status::{detect_local, FailoverStatus};
pub use steps::{BackupStep, FailurePolicy, MasterStep};
pub use storage::{ExportVerdict, ImportReport, StorageTransitionManager};
pub use validator::EventValidator;
