//! Builds the runtime object graph from configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use swarmspawn_coordinator::{SpawnCoordinator, SpawnSettings};
use swarmspawn_core::SpawnerConfig;
use swarmspawn_core::config::{EngineConfig, TopologySourceKind};
use swarmspawn_engine::{EngineApi, EngineClient};
use swarmspawn_placement::PlacementDefaults;
use swarmspawn_topology::{
    ClusterTopologyCache, EngineInfoSource, StaticTopologySource, TopologySource,
};

/// Load `path` (or defaults), applying an endpoint override.
pub fn load_config(path: Option<&Path>, engine: Option<&str>) -> anyhow::Result<SpawnerConfig> {
    let mut config = match path {
        Some(path) => SpawnerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SpawnerConfig::default(),
    };

    if let Some(endpoint) = engine {
        config
            .engine
            .get_or_insert_with(EngineConfig::default)
            .endpoint = Some(endpoint.to_string());
    }
    Ok(config)
}

pub fn engine(config: &SpawnerConfig) -> anyhow::Result<Arc<dyn EngineApi>> {
    let client = EngineClient::from_url(config.engine_endpoint(), config.request_timeout()?)?;
    info!(endpoint = %client.endpoint(), timeout = ?client.timeout(), "engine client ready");
    Ok(Arc::new(client))
}

pub fn topology(
    config: &SpawnerConfig,
    engine: Arc<dyn EngineApi>,
) -> anyhow::Result<Arc<ClusterTopologyCache>> {
    let source: Arc<dyn TopologySource> = match config.topology_source() {
        TopologySourceKind::Engine => Arc::new(EngineInfoSource::new(engine)),
        TopologySourceKind::Static => Arc::new(StaticTopologySource::new(config.static_nodes())?),
    };
    debug!(source = source.kind(), "topology source selected");
    Ok(Arc::new(ClusterTopologyCache::new(source)))
}

pub fn coordinator(config: &SpawnerConfig) -> anyhow::Result<SpawnCoordinator> {
    let engine = engine(config)?;
    let topology = topology(config, engine.clone())?;
    Ok(SpawnCoordinator::new(
        engine,
        topology,
        PlacementDefaults::from_config(config)?,
        SpawnSettings::from_config(config)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_override_wins() {
        let config = load_config(None, Some("unix:///var/run/docker.sock")).unwrap();
        assert_eq!(config.engine_endpoint(), "unix:///var/run/docker.sock");
    }

    #[test]
    fn defaults_without_file() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config.engine_endpoint(), "tcp://127.0.0.1:2375");
        assert_eq!(config.topology_source(), TopologySourceKind::Engine);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/spawner.toml")), None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/spawner.toml"));
    }

    #[test]
    fn static_source_is_built_from_config() {
        let config: SpawnerConfig = toml::from_str(
            r#"
            [topology]
            source = "static"
            nodes = [{ id = "nodeA", address = "10.0.0.5:2375" }]
            "#,
        )
        .unwrap();
        let engine: Arc<dyn EngineApi> = Arc::new(swarmspawn_engine::fake::FakeEngine::new());
        let cache = topology(&config, engine).unwrap();
        assert_eq!(cache.version(), 0);
    }

    #[test]
    fn coordinator_builds_from_defaults() {
        let config = load_config(None, None).unwrap();
        let coordinator = coordinator(&config).unwrap();
        assert_eq!(coordinator.settings(), &SpawnSettings::default());
    }
}
