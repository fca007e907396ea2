//! Per-spawn state machine.
//!
//! A spawn moves strictly forward through
//! `Created → TopologyRefreshed → ContainerPlaced → AddressResolved → Ready`,
//! or into `Failed` from any non-terminal phase. Nothing is revisited;
//! retries happen inside a phase, never by stepping back.

use std::fmt;

use swarmspawn_core::ContainerId;
use tokio::time::Instant;

use crate::error::{SpawnError, SpawnFailure};

/// Phase of a single spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPhase {
    Created,
    TopologyRefreshed,
    ContainerPlaced,
    AddressResolved,
    Ready,
    Failed,
}

impl SpawnPhase {
    /// The only forward successor, if any.
    pub fn successor(self) -> Option<SpawnPhase> {
        match self {
            SpawnPhase::Created => Some(SpawnPhase::TopologyRefreshed),
            SpawnPhase::TopologyRefreshed => Some(SpawnPhase::ContainerPlaced),
            SpawnPhase::ContainerPlaced => Some(SpawnPhase::AddressResolved),
            SpawnPhase::AddressResolved => Some(SpawnPhase::Ready),
            SpawnPhase::Ready | SpawnPhase::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SpawnPhase::Ready | SpawnPhase::Failed)
    }

    pub fn can_transition_to(self, next: SpawnPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == SpawnPhase::Failed || self.successor() == Some(next)
    }
}

impl fmt::Display for SpawnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpawnPhase::Created => "created",
            SpawnPhase::TopologyRefreshed => "topology_refreshed",
            SpawnPhase::ContainerPlaced => "container_placed",
            SpawnPhase::AddressResolved => "address_resolved",
            SpawnPhase::Ready => "ready",
            SpawnPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One spawn in progress. Discarded once it reaches a terminal phase.
#[derive(Debug)]
pub struct SpawnAttempt {
    session: String,
    phase: SpawnPhase,
    container_id: Option<ContainerId>,
    started_at: Instant,
}

impl SpawnAttempt {
    pub fn new(session: &str) -> Self {
        Self {
            session: session.to_string(),
            phase: SpawnPhase::Created,
            container_id: None,
            started_at: Instant::now(),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn phase(&self) -> SpawnPhase {
        self.phase
    }

    /// Id of the container created by this spawn, once placed.
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Move to `next`, rejecting anything but the forward successor.
    pub fn advance(&mut self, next: SpawnPhase) -> Result<(), SpawnError> {
        if next == SpawnPhase::Failed || !self.phase.can_transition_to(next) {
            return Err(SpawnError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Record the created container and enter `ContainerPlaced`.
    pub fn placed(&mut self, container_id: ContainerId) -> Result<(), SpawnError> {
        self.advance(SpawnPhase::ContainerPlaced)?;
        self.container_id = Some(container_id);
        Ok(())
    }

    /// Remember a container that exists even though placement failed.
    pub fn record_orphan(&mut self, container_id: ContainerId) {
        self.container_id = Some(container_id);
    }

    /// Enter `Failed` and produce the terminal failure.
    ///
    /// The failure reports the phase the spawn was in when it failed.
    pub fn fail(&mut self, error: SpawnError) -> SpawnFailure {
        let phase = self.phase;
        if !phase.is_terminal() {
            self.phase = SpawnPhase::Failed;
        }
        SpawnFailure {
            session: self.session.clone(),
            phase,
            container_id: self.container_id.clone(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_forward_to_ready() {
        let mut attempt = SpawnAttempt::new("s");
        attempt.advance(SpawnPhase::TopologyRefreshed).unwrap();
        attempt.placed("c1".to_string()).unwrap();
        attempt.advance(SpawnPhase::AddressResolved).unwrap();
        attempt.advance(SpawnPhase::Ready).unwrap();

        assert_eq!(attempt.phase(), SpawnPhase::Ready);
        assert_eq!(attempt.container_id(), Some("c1"));
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut attempt = SpawnAttempt::new("s");
        let err = attempt.advance(SpawnPhase::ContainerPlaced).unwrap_err();
        assert!(matches!(
            err,
            SpawnError::InvalidTransition {
                from: SpawnPhase::Created,
                to: SpawnPhase::ContainerPlaced
            }
        ));
        assert_eq!(attempt.phase(), SpawnPhase::Created);
    }

    #[test]
    fn no_phase_is_revisited() {
        let mut attempt = SpawnAttempt::new("s");
        attempt.advance(SpawnPhase::TopologyRefreshed).unwrap();
        assert!(attempt.advance(SpawnPhase::TopologyRefreshed).is_err());
        assert!(attempt.advance(SpawnPhase::Created).is_err());
    }

    #[test]
    fn fail_from_any_phase_keeps_container() {
        let mut attempt = SpawnAttempt::new("s");
        attempt.advance(SpawnPhase::TopologyRefreshed).unwrap();
        attempt.placed("c1".to_string()).unwrap();

        let failure = attempt.fail(SpawnError::Cancelled {
            phase: SpawnPhase::ContainerPlaced,
        });
        assert_eq!(failure.phase, SpawnPhase::ContainerPlaced);
        assert_eq!(failure.container_id.as_deref(), Some("c1"));
        assert_eq!(attempt.phase(), SpawnPhase::Failed);
    }

    #[test]
    fn terminal_phases_accept_nothing() {
        for terminal in [SpawnPhase::Ready, SpawnPhase::Failed] {
            for next in [
                SpawnPhase::Created,
                SpawnPhase::TopologyRefreshed,
                SpawnPhase::ContainerPlaced,
                SpawnPhase::AddressResolved,
                SpawnPhase::Ready,
                SpawnPhase::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn failed_cannot_be_entered_via_advance() {
        let mut attempt = SpawnAttempt::new("s");
        assert!(attempt.advance(SpawnPhase::Failed).is_err());
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&SpawnPhase::TopologyRefreshed).unwrap();
        assert_eq!(json, "\"topology_refreshed\"");
        assert_eq!(SpawnPhase::ContainerPlaced.to_string(), "container_placed");
    }
}
