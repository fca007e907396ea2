//! swarmspawn.toml configuration parser.
//!
//! Every section and key is optional; accessors fall back to the defaults
//! below so an empty file is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::units::{UnitError, parse_duration, parse_memory_size};

pub const DEFAULT_ENGINE_ENDPOINT: &str = "tcp://127.0.0.1:2375";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MEMORY_LIMIT_BYTES: u64 = 1024 * 1024 * 1024;
pub const DEFAULT_CONTAINER_PORT: u16 = 8888;
pub const DEFAULT_BIND_IP: &str = "0.0.0.0";
pub const DEFAULT_RESOLVE_ATTEMPTS: u32 = 5;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnerConfig {
    pub engine: Option<EngineConfig>,
    pub placement: Option<PlacementConfig>,
    pub resolve: Option<ResolveConfig>,
    pub spawn: Option<SpawnConfig>,
    pub topology: Option<TopologyConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `tcp://host:port` or `unix:///path/to/socket`.
    pub endpoint: Option<String>,
    pub request_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementConfig {
    pub default_memory_limit: Option<String>,
    /// Fixed working directory; when unset the session home directory is used.
    pub default_working_dir: Option<String>,
    pub container_port: Option<u16>,
    /// Host interface the session port is published on.
    pub bind_ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    pub max_attempts: Option<u32>,
    pub initial_backoff: Option<String>,
    pub max_backoff: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub total_timeout: Option<String>,
    pub stop_grace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub source: Option<TopologySourceKind>,
    /// Static node list, used when `source = "static"`.
    pub nodes: Option<Vec<StaticNode>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologySourceKind {
    /// Parse the engine's `/info` node status lines.
    #[default]
    Engine,
    /// Use `[[topology.nodes]]` from this file.
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticNode {
    pub id: String,
    /// `ip:port` of the node's engine endpoint.
    pub address: String,
}

impl SpawnerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SpawnerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every unit-bearing value parses.
    pub fn validate(&self) -> Result<(), UnitError> {
        self.request_timeout()?;
        self.default_memory_limit()?;
        self.initial_backoff()?;
        self.max_backoff()?;
        self.total_timeout()?;
        self.stop_grace()?;
        Ok(())
    }

    pub fn engine_endpoint(&self) -> &str {
        self.engine
            .as_ref()
            .and_then(|e| e.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENGINE_ENDPOINT)
    }

    pub fn request_timeout(&self) -> Result<Duration, UnitError> {
        duration_or(
            self.engine.as_ref().and_then(|e| e.request_timeout.as_deref()),
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    pub fn default_memory_limit(&self) -> Result<u64, UnitError> {
        match self.placement.as_ref().and_then(|p| p.default_memory_limit.as_deref()) {
            Some(s) => parse_memory_size(s),
            None => Ok(DEFAULT_MEMORY_LIMIT_BYTES),
        }
    }

    pub fn default_working_dir(&self) -> Option<&str> {
        self.placement.as_ref().and_then(|p| p.default_working_dir.as_deref())
    }

    pub fn container_port(&self) -> u16 {
        self.placement
            .as_ref()
            .and_then(|p| p.container_port)
            .unwrap_or(DEFAULT_CONTAINER_PORT)
    }

    pub fn bind_ip(&self) -> &str {
        self.placement
            .as_ref()
            .and_then(|p| p.bind_ip.as_deref())
            .unwrap_or(DEFAULT_BIND_IP)
    }

    pub fn resolve_attempts(&self) -> u32 {
        self.resolve
            .as_ref()
            .and_then(|r| r.max_attempts)
            .unwrap_or(DEFAULT_RESOLVE_ATTEMPTS)
    }

    pub fn initial_backoff(&self) -> Result<Duration, UnitError> {
        duration_or(
            self.resolve.as_ref().and_then(|r| r.initial_backoff.as_deref()),
            DEFAULT_INITIAL_BACKOFF,
        )
    }

    pub fn max_backoff(&self) -> Result<Duration, UnitError> {
        duration_or(
            self.resolve.as_ref().and_then(|r| r.max_backoff.as_deref()),
            DEFAULT_MAX_BACKOFF,
        )
    }

    pub fn total_timeout(&self) -> Result<Duration, UnitError> {
        duration_or(
            self.spawn.as_ref().and_then(|s| s.total_timeout.as_deref()),
            DEFAULT_TOTAL_TIMEOUT,
        )
    }

    pub fn stop_grace(&self) -> Result<Duration, UnitError> {
        duration_or(
            self.spawn.as_ref().and_then(|s| s.stop_grace.as_deref()),
            DEFAULT_STOP_GRACE,
        )
    }

    pub fn topology_source(&self) -> TopologySourceKind {
        self.topology
            .as_ref()
            .and_then(|t| t.source)
            .unwrap_or_default()
    }

    pub fn static_nodes(&self) -> &[StaticNode] {
        self.topology
            .as_ref()
            .and_then(|t| t.nodes.as_deref())
            .unwrap_or(&[])
    }
}

fn duration_or(value: Option<&str>, default: Duration) -> Result<Duration, UnitError> {
    value.map_or(Ok(default), parse_duration)
}
