//! The engine seam.
//!
//! Topology discovery, placement, and resolution all reach the engine
//! through [`EngineApi`], so they can run against [`EngineClient`] in
//! production and against a scripted engine in tests.
//!
//! [`EngineClient`]: crate::EngineClient

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::EngineError;
use crate::wire::{ContainerConfig, ContainerSummary, CreatedContainer, EngineInfo};

/// Boxed future alias for engine calls.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// Operations the spawner needs from the orchestration engine.
pub trait EngineApi: Send + Sync {
    /// `GET /info`.
    fn info(&self) -> EngineFuture<'_, EngineInfo>;

    /// `GET /containers/json?all=1` — every container, running or not.
    fn list_containers(&self) -> EngineFuture<'_, Vec<ContainerSummary>>;

    /// `POST /containers/create?name=<name>`.
    fn create_container<'a>(
        &'a self,
        name: &'a str,
        config: &'a ContainerConfig,
    ) -> EngineFuture<'a, CreatedContainer>;

    /// `POST /containers/{id}/start`. Starting a running container is not an error.
    fn start_container<'a>(&'a self, id: &'a str) -> EngineFuture<'a, ()>;

    /// `POST /containers/{id}/stop?t=<grace>`. Stopping a stopped container is not an error.
    fn stop_container<'a>(&'a self, id: &'a str, grace: Duration) -> EngineFuture<'a, ()>;

    /// `DELETE /containers/{id}?force=1`.
    fn remove_container<'a>(&'a self, id: &'a str) -> EngineFuture<'a, ()>;
}
