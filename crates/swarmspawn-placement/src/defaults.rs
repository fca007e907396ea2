//! Deployment defaults for session containers.

use swarmspawn_core::config::{
    DEFAULT_BIND_IP, DEFAULT_CONTAINER_PORT, DEFAULT_MEMORY_LIMIT_BYTES,
};
use swarmspawn_core::{PlacementRequest, SpawnerConfig, UnitError};

/// Values applied to requests that leave them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDefaults {
    pub memory_bytes: u64,
    /// Fixed working directory; `None` means "the session's home directory".
    pub working_dir: Option<String>,
    pub container_port: u16,
    /// Host interface the session port is published on.
    pub bind_ip: String,
}

impl Default for PlacementDefaults {
    fn default() -> Self {
        Self {
            memory_bytes: DEFAULT_MEMORY_LIMIT_BYTES,
            working_dir: None,
            container_port: DEFAULT_CONTAINER_PORT,
            bind_ip: DEFAULT_BIND_IP.to_string(),
        }
    }
}

impl PlacementDefaults {
    pub fn from_config(config: &SpawnerConfig) -> Result<Self, UnitError> {
        Ok(Self {
            memory_bytes: config.default_memory_limit()?,
            working_dir: config.default_working_dir().map(str::to_string),
            container_port: config.container_port(),
            bind_ip: config.bind_ip().to_string(),
        })
    }

    /// Return the effective request: caller values win, defaults fill gaps.
    ///
    /// Applying twice yields the same request as applying once.
    pub fn apply(&self, request: &PlacementRequest) -> PlacementRequest {
        let mut effective = request.clone();

        effective
            .resource_limits
            .memory_bytes
            .get_or_insert(self.memory_bytes);

        if effective.working_dir.is_none() {
            effective.working_dir = Some(
                self.working_dir
                    .clone()
                    .unwrap_or_else(|| request.home_dir.clone()),
            );
        }

        effective.container_port.get_or_insert(self.container_port);
        effective
    }
}
