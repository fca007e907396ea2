//! The interface a host spawner framework programs against.

use std::future::Future;
use std::pin::Pin;

use swarmspawn_core::{PlacementRequest, ResolvedEndpoint, SessionStatus};

use crate::error::{SpawnError, SpawnFailure};

/// Boxed future alias for spawner calls.
pub type SpawnerFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Session lifecycle as seen by the host framework.
///
/// Implementations own every detail of how and where the session runs;
/// hosts only ever see requests, endpoints, and container ids.
pub trait Spawner: Send + Sync {
    /// Start a session and return where it can be reached.
    fn start<'a>(
        &'a self,
        request: &'a PlacementRequest,
    ) -> SpawnerFuture<'a, ResolvedEndpoint, SpawnFailure>;

    /// Stop and remove a session container. Unknown ids are not an error.
    fn stop<'a>(&'a self, container_id: &'a str) -> SpawnerFuture<'a, (), SpawnError>;

    /// Report whether a session container is still running.
    fn poll<'a>(&'a self, container_id: &'a str) -> SpawnerFuture<'a, SessionStatus, SpawnError>;
}
