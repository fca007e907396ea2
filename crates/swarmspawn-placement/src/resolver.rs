//! Address resolution — which node did the engine pick, and how do we
//! reach the session there?
//!
//! The engine exposes placement only through the aggregate container
//! listing, where a Swarm manager names each container
//! `/<node>/<container>`. Resolution therefore scans the full listing
//! for the container id, recovers the node from the name, and maps the
//! node to an address through a topology snapshot. The scan is
//! O(containers) but runs once per session start.

use std::sync::Arc;

use tracing::debug;

use swarmspawn_core::{ResolvedEndpoint, SessionStatus};
use swarmspawn_engine::{ContainerSummary, EngineApi};
use swarmspawn_topology::TopologySnapshot;

use crate::error::ResolveError;

/// Resolves container ids to routable endpoints.
pub struct AddressResolver {
    engine: Arc<dyn EngineApi>,
}

impl AddressResolver {
    pub fn new(engine: Arc<dyn EngineApi>) -> Self {
        Self { engine }
    }

    /// Resolve `container_id` against a fresh listing and `topology`.
    ///
    /// A single attempt; retrying transient failures is up to the caller.
    pub async fn resolve(
        &self,
        container_id: &str,
        topology: &TopologySnapshot,
        container_port: u16,
    ) -> Result<ResolvedEndpoint, ResolveError> {
        let listing = self.engine.list_containers().await?;
        debug!(container_id, listed = listing.len(), version = topology.version(), "resolving container");
        resolve_in_listing(&listing, container_id, topology, container_port)
    }

    /// Current lifecycle status of `container_id`.
    pub async fn status(&self, container_id: &str) -> Result<SessionStatus, ResolveError> {
        let listing = self.engine.list_containers().await?;
        Ok(status_in_listing(&listing, container_id))
    }
}

/// Pure resolution over an already-fetched listing.
pub fn resolve_in_listing(
    listing: &[ContainerSummary],
    container_id: &str,
    topology: &TopologySnapshot,
    container_port: u16,
) -> Result<ResolvedEndpoint, ResolveError> {
    let summary = ContainerSummary::find(listing, container_id)
        .ok_or_else(|| ResolveError::PlacementNotYetVisible {
            container_id: container_id.to_string(),
        })?;

    let node_id = summary
        .names
        .iter()
        .find_map(|name| parse_node_name(name).map(|(node, _)| node))
        .ok_or_else(|| ResolveError::MalformedContainerName {
            name: summary
                .names
                .first()
                .cloned()
                .unwrap_or_else(|| "<none>".to_string()),
        })?;

    let ip = topology
        .lookup(node_id)
        .ok_or_else(|| ResolveError::UnknownNode {
            node_id: node_id.to_string(),
        })?;

    let port = summary.public_port(container_port).unwrap_or(container_port);

    Ok(ResolvedEndpoint {
        node_id: node_id.to_string(),
        ip,
        port,
    })
}

/// Status of `container_id` in `listing`.
pub fn status_in_listing(listing: &[ContainerSummary], container_id: &str) -> SessionStatus {
    match ContainerSummary::find(listing, container_id) {
        None => SessionStatus::Missing,
        Some(c) if c.is_running() => SessionStatus::Running,
        Some(c) => SessionStatus::Exited {
            status: c
                .status
                .clone()
                .or_else(|| c.state.clone())
                .unwrap_or_default(),
        },
    }
}

/// Split `/<node>/<name>` into `(node, name)`.
///
/// Both segments must be non-empty and there must be exactly two.
pub fn parse_node_name(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix('/')?;
    let (node, container) = rest.split_once('/')?;
    if node.is_empty() || container.is_empty() || container.contains('/') {
        return None;
    }
    Some((node, container))
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmspawn_engine::PortMapping;
    use swarmspawn_engine::fake::FakeEngine;
    use swarmspawn_topology::NodeRecord;

    fn topology(nodes: &[(&str, &str)]) -> TopologySnapshot {
        TopologySnapshot::from_records(
            1,
            nodes.iter().map(|(id, ip)| NodeRecord {
                node_id: id.to_string(),
                address: ip.parse().unwrap(),
                engine_port: 2375,
                last_seen: 0,
            }),
        )
    }

    fn container(id: &str, names: &[&str]) -> ContainerSummary {
        ContainerSummary {
            id: id.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            state: Some("running".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_node_from_name() {
        let listing = vec![container("c1", &["/nodeA/sessionX"])];
        let endpoint =
            resolve_in_listing(&listing, "c1", &topology(&[("nodeA", "10.0.0.5")]), 8888).unwrap();

        assert_eq!(endpoint.node_id, "nodeA");
        assert_eq!(endpoint.ip, "10.0.0.5".parse::<std::net::IpAddr>().unwrap());
        assert_eq!(endpoint.port, 8888);
    }

    #[test]
    fn absent_container_is_not_yet_visible() {
        let listing = vec![container("c2", &["/nodeA/other"])];
        let err = resolve_in_listing(&listing, "c1", &topology(&[("nodeA", "10.0.0.5")]), 8888)
            .unwrap_err();
        assert!(matches!(err, ResolveError::PlacementNotYetVisible { ref container_id } if container_id == "c1"));
        assert!(err.is_transient());
    }

    #[test]
    fn node_missing_from_topology_is_unknown() {
        let listing = vec![container("c1", &["/nodeZ/sessionX"])];
        let err = resolve_in_listing(&listing, "c1", &topology(&[("nodeA", "10.0.0.5")]), 8888)
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownNode { ref node_id } if node_id == "nodeZ"));
        assert!(!err.is_transient());
    }

    #[test]
    fn single_segment_name_is_malformed() {
        let listing = vec![container("c1", &["/sessionX"])];
        let err = resolve_in_listing(&listing, "c1", &topology(&[("nodeA", "10.0.0.5")]), 8888)
            .unwrap_err();
        assert!(matches!(err, ResolveError::MalformedContainerName { ref name } if name == "/sessionX"));
    }

    #[test]
    fn nameless_container_is_malformed() {
        let listing = vec![container("c1", &[])];
        let err = resolve_in_listing(&listing, "c1", &topology(&[]), 8888).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedContainerName { ref name } if name == "<none>"));
    }

    #[test]
    fn first_well_formed_name_wins() {
        // Linked containers get extra aliases like /nodeA/web/db.
        let listing = vec![container("c1", &["/nodeA/web/db", "/nodeA/sessionX"])];
        let endpoint =
            resolve_in_listing(&listing, "c1", &topology(&[("nodeA", "10.0.0.5")]), 8888).unwrap();
        assert_eq!(endpoint.node_id, "nodeA");
    }

    #[test]
    fn published_port_is_preferred() {
        let mut c = container("c1", &["/nodeA/sessionX"]);
        c.ports = vec![
            PortMapping {
                ip: Some("0.0.0.0".to_string()),
                private_port: 22,
                public_port: Some(32000),
                kind: Some("tcp".to_string()),
            },
            PortMapping {
                ip: Some("0.0.0.0".to_string()),
                private_port: 8888,
                public_port: Some(32771),
                kind: Some("tcp".to_string()),
            },
        ];
        let endpoint =
            resolve_in_listing(&[c], "c1", &topology(&[("nodeA", "10.0.0.5")]), 8888).unwrap();
        assert_eq!(endpoint.port, 32771);
        assert_eq!(endpoint.address(), "10.0.0.5:32771");
    }

    #[test]
    fn short_id_prefix_matches() {
        let long = "4fa6e0f0c6786287e131c3852c58a2e01cc697a68231826813597e4994f1d6e2";
        let listing = vec![container(long, &["/nodeA/sessionX"])];
        let endpoint =
            resolve_in_listing(&listing, &long[..12], &topology(&[("nodeA", "10.0.0.5")]), 8888)
                .unwrap();
        assert_eq!(endpoint.node_id, "nodeA");
    }

    #[test]
    fn ambiguous_short_id_is_not_resolved() {
        let listing = vec![
            container("4fa6e0f0c6786287e1", &["/nodeA/sessionX"]),
            container("4fa6e0f0c678aa01c2", &["/nodeB/sessionY"]),
        ];
        let topo = topology(&[("nodeA", "10.0.0.5"), ("nodeB", "10.0.0.6")]);

        let err = resolve_in_listing(&listing, "4fa6e0f0c678", &topo, 8888).unwrap_err();
        assert!(matches!(err, ResolveError::PlacementNotYetVisible { .. }));
        assert_eq!(status_in_listing(&listing, "4fa6e0f0c678"), SessionStatus::Missing);
        assert_eq!(
            resolve_in_listing(&listing, "4fa6e0f0c678aa", &topo, 8888).unwrap().node_id,
            "nodeB"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let listing = vec![
            container("c0", &["/nodeB/a"]),
            container("c1", &["/nodeA/sessionX"]),
            container("c3", &["/nodeZ/b"]),
        ];
        let topo = topology(&[("nodeA", "10.0.0.5"), ("nodeB", "10.0.0.6")]);

        let first = resolve_in_listing(&listing, "c1", &topo, 8888).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve_in_listing(&listing, "c1", &topo, 8888).unwrap(), first);
            assert!(matches!(
                resolve_in_listing(&listing, "c3", &topo, 8888),
                Err(ResolveError::UnknownNode { .. })
            ));
        }
    }

    #[test]
    fn parse_node_name_shapes() {
        assert_eq!(parse_node_name("/nodeA/sessionX"), Some(("nodeA", "sessionX")));
        assert_eq!(parse_node_name("nodeA/sessionX"), None);
        assert_eq!(parse_node_name("/sessionX"), None);
        assert_eq!(parse_node_name("//sessionX"), None);
        assert_eq!(parse_node_name("/nodeA/"), None);
        assert_eq!(parse_node_name("/a/b/c"), None);
    }

    #[test]
    fn status_from_listing() {
        let mut exited = container("c2", &["/nodeA/b"]);
        exited.state = Some("exited".to_string());
        exited.status = Some("Exited (137) 5 seconds ago".to_string());
        let listing = vec![container("c1", &["/nodeA/a"]), exited];

        assert_eq!(status_in_listing(&listing, "c1"), SessionStatus::Running);
        assert_eq!(
            status_in_listing(&listing, "c2"),
            SessionStatus::Exited {
                status: "Exited (137) 5 seconds ago".to_string()
            }
        );
        assert_eq!(status_in_listing(&listing, "c9"), SessionStatus::Missing);
    }

    #[tokio::test]
    async fn resolver_lists_the_engine() {
        let engine = Arc::new(FakeEngine::new());
        engine.add_container(container("c1", &["/nodeA/sessionX"]));

        let resolver = AddressResolver::new(engine.clone());
        let endpoint = resolver
            .resolve("c1", &topology(&[("nodeA", "10.0.0.5")]), 8888)
            .await
            .unwrap();
        assert_eq!(endpoint.node_id, "nodeA");
        assert_eq!(resolver.status("c1").await.unwrap(), SessionStatus::Running);
        assert_eq!(engine.count("list"), 2);
    }
}
