//! Role event intake
//!
//! Parses VRRP state-change notifications into `RoleEvent`s and feeds
//! them to the orchestrator. The notification wire format is the
//! whitespace-separated line keepalived writes to its fifo:
//!
//! ```text
//! INSTANCE "em0_v4" MASTER 240
//! ```
//!
//! Field 2 is the quoted interface/instance name, field 3 the new state.
//! Anything that is not a well-formed MASTER/BACKUP line is dropped.

use crate::cluster::{best_effort, Collaborators, RoleChanged};
use crate::observability::{Event, Logger};

use std::sync::Arc;

use super::errors::TransitionOutcome;
use super::orchestrator::FailoverOrchestrator;

/// Which role the election signal carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Master,
    Backup,
    /// Operator-initiated takeover; bypasses the sanity checks a plain
    /// MASTER event is subject to.
    ForceTakeover,
}

impl RoleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RoleKind::Master => "MASTER",
            RoleKind::Backup => "BACKUP",
            RoleKind::ForceTakeover => "forcetakeover",
        }
    }
}

/// A parsed election signal for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEvent {
    pub interface: String,
    pub kind: RoleKind,
}

/// Parse one notification line. Returns `None` for malformed lines and
/// for states other than MASTER/BACKUP (e.g. FAULT).
pub fn parse_notification(line: &str) -> Option<RoleEvent> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }
    let interface = fields[1].trim_matches('"');
    if interface.is_empty() {
        return None;
    }
    let kind = match fields[2] {
        "MASTER" => RoleKind::Master,
        "BACKUP" => RoleKind::Backup,
        _ => return None,
    };
    Some(RoleEvent {
        interface: interface.to_string(),
        kind,
    })
}

/// Front door for notification lines: parse, announce, dispatch.
pub struct EventIntake {
    collab: Collaborators,
    orchestrator: Arc<FailoverOrchestrator>,
}

impl EventIntake {
    pub fn new(collab: Collaborators, orchestrator: Arc<FailoverOrchestrator>) -> Self {
        Self {
            collab,
            orchestrator,
        }
    }

    /// Handle one raw notification line. Returns `None` when the line
    /// does not parse to a role event.
    pub fn handle_line(&self, line: &str) -> Option<TransitionOutcome> {
        let event = parse_notification(line)?;

        // The role change is announced to subscribers before any
        // validation; listeners learn about every received signal even
        // when the transition is later ignored.
        let change = RoleChanged::new(&event.interface, event.kind.name());
        best_effort(self.collab.sink.publish(&change));
        Logger::info(
            Event::RoleChangePublished.name(),
            &[("interface", event.interface.as_str()), ("role", event.kind.name())],
        );

        Some(self.orchestrator.handle_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_master_notification() {
        let event = parse_notification("INSTANCE \"em0_v4\" MASTER 240").unwrap();
        assert_eq!(event.interface, "em0_v4");
        assert_eq!(event.kind, RoleKind::Master);
    }

    #[test]
    fn parses_backup_notification() {
        let event = parse_notification("INSTANCE \"igb1\" BACKUP 100").unwrap();
        assert_eq!(event.interface, "igb1");
        assert_eq!(event.kind, RoleKind::Backup);
    }

    #[test]
    fn rejects_short_lines() {
        assert!(parse_notification("").is_none());
        assert!(parse_notification("INSTANCE \"em0\" MASTER").is_none());
    }

    #[test]
    fn rejects_unknown_states() {
        assert!(parse_notification("INSTANCE \"em0\" FAULT 240").is_none());
        assert!(parse_notification("INSTANCE \"em0\" STOP 240").is_none());
    }

    #[test]
    fn strips_quotes_from_interface() {
        let event = parse_notification("GROUP \"ha_group\" BACKUP 90").unwrap();
        assert_eq!(event.interface, "ha_group");
    }
}
