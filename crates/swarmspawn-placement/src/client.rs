//! Placement client — creates and starts session containers.
//!
//! Creation is not idempotent (a replayed create either conflicts on the
//! name or makes a second container), so this client never retries. The
//! caller decides what to do with a failure, and gets the container id
//! whenever one exists.

use std::sync::Arc;

use tracing::{error, info, warn};

use swarmspawn_core::{PlacementRequest, PlacementResult};
use swarmspawn_engine::EngineApi;

use crate::convert::request_to_container_config;
use crate::defaults::PlacementDefaults;
use crate::error::PlacementError;

/// Submits placement requests to the engine.
pub struct PlacementClient {
    engine: Arc<dyn EngineApi>,
    defaults: PlacementDefaults,
}

impl PlacementClient {
    pub fn new(engine: Arc<dyn EngineApi>, defaults: PlacementDefaults) -> Self {
        Self { engine, defaults }
    }

    pub fn defaults(&self) -> &PlacementDefaults {
        &self.defaults
    }

    /// The request as it will be submitted, with defaults applied.
    pub fn effective_request(&self, request: &PlacementRequest) -> PlacementRequest {
        self.defaults.apply(request)
    }

    /// Create and start the session container.
    pub async fn create(&self, request: &PlacementRequest) -> Result<PlacementResult, PlacementError> {
        validate_name(&request.session_name)?;

        let effective = self.effective_request(request);
        let config = request_to_container_config(&effective, &self.defaults.bind_ip);
        let name = effective.session_name.as_str();

        let created = self
            .engine
            .create_container(name, &config)
            .await
            .map_err(|e| {
                error!(session = name, error = %e, "container create rejected");
                PlacementError::Failed {
                    reason: e.reason(),
                    container_id: None,
                }
            })?;

        for warning in created.warnings.iter().flatten() {
            warn!(session = name, container_id = %created.id, %warning, "engine warning on create");
        }

        if let Err(e) = self.engine.start_container(&created.id).await {
            error!(session = name, container_id = %created.id, error = %e, "container start failed");
            return Err(PlacementError::Failed {
                reason: e.reason(),
                container_id: Some(created.id),
            });
        }

        let assigned_node_id = created.node.map(|n| n.name);
        info!(
            session = name,
            container_id = %created.id,
            image = %effective.image,
            memory_bytes = ?effective.resource_limits.memory_bytes,
            working_dir = ?effective.working_dir,
            node = ?assigned_node_id,
            "container started"
        );

        Ok(PlacementResult {
            container_id: created.id,
            container_name: effective.session_name,
            assigned_node_id,
        })
    }
}

/// Engine container names: `[a-zA-Z0-9][a-zA-Z0-9_.-]+`.
///
/// A `/` in particular would make the `/<node>/<name>` form ambiguous.
fn validate_name(name: &str) -> Result<(), PlacementError> {
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = name.len() >= 2
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if first_ok && rest_ok {
        Ok(())
    } else {
        Err(PlacementError::InvalidName(name.to_string()))
    }
}
