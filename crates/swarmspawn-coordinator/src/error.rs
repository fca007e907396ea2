//! Coordinator error types.

use std::time::Duration;

use swarmspawn_core::{ContainerId, NodeId};
use swarmspawn_engine::EngineError;
use swarmspawn_placement::{PlacementError, ResolveError};
use thiserror::Error;

use crate::phase::SpawnPhase;

/// Why a spawn (or a stop/poll) failed.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// No topology could be obtained and no earlier snapshot exists.
    #[error("topology unavailable: {0}")]
    TopologyUnavailable(String),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("container {container_id} still not listed after {attempts} attempts")]
    NotYetVisible {
        container_id: ContainerId,
        attempts: u32,
    },

    #[error("container landed on node {node_id}, which is not in the topology")]
    UnknownNode { node_id: NodeId },

    #[error("container name {name:?} is not of the form /<node>/<name>")]
    MalformedContainerName { name: String },

    #[error("spawn timed out during {phase} after {after:?}")]
    TimedOut { phase: SpawnPhase, after: Duration },

    #[error("spawn cancelled during {phase}")]
    Cancelled { phase: SpawnPhase },

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("illegal spawn transition {from} -> {to}")]
    InvalidTransition { from: SpawnPhase, to: SpawnPhase },
}

impl From<ResolveError> for SpawnError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::PlacementNotYetVisible { container_id } => SpawnError::NotYetVisible {
                container_id,
                attempts: 1,
            },
            ResolveError::UnknownNode { node_id } => SpawnError::UnknownNode { node_id },
            ResolveError::MalformedContainerName { name } => {
                SpawnError::MalformedContainerName { name }
            }
            ResolveError::Engine(e) => SpawnError::Engine(e),
        }
    }
}

/// Terminal outcome of a failed spawn.
///
/// `container_id` is set whenever a container was created, so the caller
/// can remove it.
#[derive(Debug, Error)]
#[error("spawn of {session} failed in {phase}: {error}")]
pub struct SpawnFailure {
    pub session: String,
    pub phase: SpawnPhase,
    pub container_id: Option<ContainerId>,
    #[source]
    pub error: SpawnError,
}
