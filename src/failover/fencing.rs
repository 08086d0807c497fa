//! Disk fencing gate
//!
//! Fencing places SCSI reservations on the shared disks so exactly one
//! node can write them. Becoming MASTER is gated on the fencing daemon
//! starting cleanly; its exit code decides whether storage may be touched
//! at all.

use std::sync::Arc;

use crate::cluster::{best_effort, FenceControl};
use crate::observability::{Event, Logger};

/// Interpreted exit code of the fencing daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceResult {
    /// Reservations held; storage may be imported.
    Ok,
    /// Keys could not be registered on the disks.
    ReservationFailed,
    /// The daemon is already running on the remote node.
    RemoteActive,
    /// Too many disks failed reservation to trust the result.
    PartialReservationFailure,
    /// The daemon hit an unexpected fatal error.
    UnknownFatal,
    /// An exit code outside the known set.
    Other(i32),
}

impl FenceResult {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::ReservationFailed,
            2 => Self::RemoteActive,
            3 => Self::PartialReservationFailure,
            5 => Self::UnknownFatal,
            other => Self::Other(other),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Operator-facing diagnostic for a non-OK result.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Ok => "fencing started".to_string(),
            Self::ReservationFailed => "fenced: failed to register keys on disks".to_string(),
            Self::RemoteActive => "fenced: fencing is running on the remote node".to_string(),
            Self::PartialReservationFailure => {
                "fenced: 10% or more of the disks failed to be reserved".to_string()
            }
            Self::UnknownFatal => "fenced: encountered an unexpected fatal error".to_string(),
            Self::Other(code) => format!("fenced: exited with code {}", code),
        }
    }
}

/// Gate in front of the fencing daemon.
pub struct FencingGate {
    fence: Arc<dyn FenceControl>,
}

impl FencingGate {
    pub fn new(fence: Arc<dyn FenceControl>) -> Self {
        Self { fence }
    }

    /// Stop fencing, best-effort. Used when becoming BACKUP; the node is
    /// giving up its reservations either way.
    pub fn stop(&self) {
        if best_effort(self.fence.stop()).is_some() {
            Logger::info(Event::FencedStopped.name(), &[]);
        }
    }

    /// Stop then start fencing. The stop always runs first; a stale
    /// fencing process must never coexist with a fresh one.
    pub fn restart(&self, force: bool) -> FenceResult {
        self.stop();
        match self.fence.start(force) {
            Ok(code) => {
                let result = FenceResult::from_code(code);
                if result.is_ok() {
                    Logger::info(
                        Event::FencedStarted.name(),
                        &[("force", if force { "true" } else { "false" })],
                    );
                }
                result
            }
            // Failing to even run the daemon is indistinguishable from a
            // fatal daemon error for the caller.
            Err(e) => {
                Logger::error(
                    Event::FencedFailed.name(),
                    &[("error", &e.to_string())],
                );
                FenceResult::UnknownFatal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testkit::MockCluster;

    #[test]
    fn exit_codes_map_to_results() {
        assert_eq!(FenceResult::from_code(0), FenceResult::Ok);
        assert_eq!(FenceResult::from_code(1), FenceResult::ReservationFailed);
        assert_eq!(FenceResult::from_code(2), FenceResult::RemoteActive);
        assert_eq!(
            FenceResult::from_code(3),
            FenceResult::PartialReservationFailure
        );
        assert_eq!(FenceResult::from_code(5), FenceResult::UnknownFatal);
        assert_eq!(FenceResult::from_code(42), FenceResult::Other(42));
    }

    #[test]
    fn restart_always_stops_first() {
        let mock = Arc::new(MockCluster::new());
        let gate = FencingGate::new(Arc::clone(&mock) as Arc<dyn FenceControl>);

        let result = gate.restart(false);
        assert!(result.is_ok());
        assert!(mock.first_index("fenced.stop") < mock.first_index("fenced.start"));
        assert!(mock.called("fenced.start force=false"));
    }

    #[test]
    fn force_is_forwarded_to_the_daemon() {
        let mock = Arc::new(MockCluster::new());
        let gate = FencingGate::new(Arc::clone(&mock) as Arc<dyn FenceControl>);

        gate.restart(true);
        assert!(mock.called("fenced.start force=true"));
    }

    #[test]
    fn non_zero_exit_is_not_ok() {
        let mut mock = MockCluster::new();
        mock.fence_code = 3;
        let mock = Arc::new(mock);
        let gate = FencingGate::new(Arc::clone(&mock) as Arc<dyn FenceControl>);

        assert_eq!(gate.restart(false), FenceResult::PartialReservationFailure);
    }
}
