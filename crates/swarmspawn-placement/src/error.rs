//! Placement and resolution error types.

use swarmspawn_core::{ContainerId, NodeId};
use swarmspawn_engine::EngineError;
use thiserror::Error;

/// Errors creating or starting a session container.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("invalid session name {0:?}")]
    InvalidName(String),

    /// The engine rejected the request. `container_id` is set when the
    /// container was created but could not be started.
    #[error("placement failed: {reason}")]
    Failed {
        reason: String,
        container_id: Option<ContainerId>,
    },
}

impl PlacementError {
    /// Id of a container left behind by the failure, if any.
    pub fn container_id(&self) -> Option<&str> {
        match self {
            PlacementError::Failed { container_id, .. } => container_id.as_deref(),
            PlacementError::InvalidName(_) => None,
        }
    }
}

/// Errors mapping a placed container to an endpoint.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The listing doesn't include the container yet; retry shortly.
    #[error("placement of container {container_id} not yet visible")]
    PlacementNotYetVisible { container_id: ContainerId },

    /// The container's node is missing from the topology snapshot.
    #[error("container is on node {node_id}, which is not in the topology")]
    UnknownNode { node_id: NodeId },

    /// None of the container's names has the `/<node>/<name>` shape.
    #[error("container name {name:?} is not of the form /<node>/<name>")]
    MalformedContainerName { name: String },

    #[error("container listing failed: {0}")]
    Engine(#[from] EngineError),
}

impl ResolveError {
    /// Whether retrying the same resolution later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::PlacementNotYetVisible { .. })
    }
}
