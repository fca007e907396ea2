//! Topology sources — where the node list comes from.
//!
//! The cache is agnostic of how nodes are discovered. A Swarm manager
//! advertises its nodes as free-text `DriverStatus` lines in `/info`;
//! deployments without one can list nodes statically in the config file.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use tracing::{debug, warn};

use swarmspawn_core::config::StaticNode;
use swarmspawn_engine::{EngineApi, EngineInfo};

use crate::error::{TopologyError, TopologyResult};
use crate::snapshot::NodeRecord;

/// A node line's value must be exactly `a.b.c.d:port`.
const SIMPLE_IP_PORT: &str = r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}:\d{1,5}$";

/// Boxed future alias for node listings.
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = TopologyResult<Vec<NodeRecord>>> + Send + 'a>>;

/// Supplies the current node list to a [`ClusterTopologyCache`].
///
/// [`ClusterTopologyCache`]: crate::ClusterTopologyCache
pub trait TopologySource: Send + Sync {
    fn list_nodes(&self) -> SourceFuture<'_>;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

// ── Engine /info ──────────────────────────────────────────────────

/// Reads nodes from the engine's `/info` `DriverStatus` lines.
pub struct EngineInfoSource {
    engine: Arc<dyn EngineApi>,
}

impl EngineInfoSource {
    pub fn new(engine: Arc<dyn EngineApi>) -> Self {
        Self { engine }
    }
}

impl TopologySource for EngineInfoSource {
    fn list_nodes(&self) -> SourceFuture<'_> {
        Box::pin(async move {
            let info = self
                .engine
                .info()
                .await
                .map_err(|e| TopologyError::Unavailable(e.to_string()))?;
            parse_driver_status(&info, epoch_secs())
        })
    }

    fn kind(&self) -> &'static str {
        "engine"
    }
}

/// Extract node records from `DriverStatus`.
///
/// Only pairs whose value is a strict `IPv4:port` are nodes; role,
/// strategy, health and other manager lines are skipped, as are values
/// that match the shape but are not a real address (`999.1.1.1:80`).
pub fn parse_driver_status(info: &EngineInfo, seen_at: u64) -> TopologyResult<Vec<NodeRecord>> {
    let ip_port = Regex::new(SIMPLE_IP_PORT)?;
    let mut nodes = Vec::new();

    for (label, value) in info.status_pairs() {
        if !ip_port.is_match(value) {
            continue;
        }
        let node_id = label.trim();
        let Some((ip, port)) = value.split_once(':') else {
            continue;
        };
        let (Ok(ip), Ok(port)) = (ip.parse::<Ipv4Addr>(), port.parse::<u16>()) else {
            debug!(node_id, value, "skipping node line with out-of-range address");
            continue;
        };
        if node_id.is_empty() {
            continue;
        }

        nodes.push(NodeRecord {
            node_id: node_id.to_string(),
            address: IpAddr::V4(ip),
            engine_port: port,
            last_seen: seen_at,
        });
    }

    Ok(nodes)
}

// ── Static list ───────────────────────────────────────────────────

/// A fixed node list, validated once at construction.
#[derive(Debug, Clone)]
pub struct StaticTopologySource {
    nodes: Vec<(String, SocketAddr)>,
}

impl StaticTopologySource {
    pub fn new(nodes: &[StaticNode]) -> TopologyResult<Self> {
        let nodes = nodes
            .iter()
            .map(|n| {
                n.address
                    .parse::<SocketAddr>()
                    .map(|addr| (n.id.clone(), addr))
                    .map_err(|_| TopologyError::InvalidAddress {
                        node_id: n.id.clone(),
                        address: n.address.clone(),
                    })
            })
            .collect::<TopologyResult<Vec<_>>>()?;

        if nodes.is_empty() {
            warn!("static topology source has no nodes");
        }
        Ok(Self { nodes })
    }
}

impl TopologySource for StaticTopologySource {
    fn list_nodes(&self) -> SourceFuture<'_> {
        let now = epoch_secs();
        let records = self
            .nodes
            .iter()
            .map(|(id, addr)| NodeRecord {
                node_id: id.clone(),
                address: addr.ip(),
                engine_port: addr.port(),
                last_seen: now,
            })
            .collect();
        Box::pin(async move { Ok(records) })
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
