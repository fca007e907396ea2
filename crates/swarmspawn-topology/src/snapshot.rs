//! Immutable, versioned views of the cluster's nodes.

use std::collections::HashMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use swarmspawn_core::NodeId;

/// One node and the address its containers are reachable at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub address: IpAddr,
    /// Port of the node's own engine endpoint, as advertised.
    pub engine_port: u16,
    /// Unix timestamp (seconds) of the refresh that produced this record.
    pub last_seen: u64,
}

/// Point-in-time mapping from node id to node record.
///
/// Version 0 is the empty snapshot a cache starts with; every successful
/// refresh publishes the next version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologySnapshot {
    version: u64,
    nodes: HashMap<NodeId, NodeRecord>,
}

impl TopologySnapshot {
    /// The empty, version-0 snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot, keeping the first record for each node id.
    pub fn from_records(version: u64, records: impl IntoIterator<Item = NodeRecord>) -> Self {
        let mut nodes: HashMap<NodeId, NodeRecord> = HashMap::new();
        for record in records {
            if let Some(existing) = nodes.get(&record.node_id) {
                warn!(
                    node_id = %record.node_id,
                    kept = %existing.address,
                    dropped = %record.address,
                    "duplicate node id in topology, keeping first entry"
                );
                continue;
            }
            nodes.insert(record.node_id.clone(), record);
        }
        Self { version, nodes }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Address of `node_id`, or `None` if this snapshot doesn't know it.
    pub fn lookup(&self, node_id: &str) -> Option<IpAddr> {
        self.nodes.get(node_id).map(|n| n.address)
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeRecord> {
        self.nodes.get(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Records sorted by node id, for stable output.
    pub fn records(&self) -> Vec<&NodeRecord> {
        let mut records: Vec<&NodeRecord> = self.nodes.values().collect();
        records.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, ip: &str) -> NodeRecord {
        NodeRecord {
            node_id: id.to_string(),
            address: ip.parse().unwrap(),
            engine_port: 2375,
            last_seen: 1_700_000_000,
        }
    }

    #[test]
    fn empty_snapshot_is_version_zero() {
        let snap = TopologySnapshot::empty();
        assert_eq!(snap.version(), 0);
        assert!(snap.is_empty());
        assert_eq!(snap.lookup("nodeA"), None);
    }

    #[test]
    fn lookup_returns_address() {
        let snap = TopologySnapshot::from_records(1, vec![record("nodeA", "10.0.0.5")]);
        assert_eq!(snap.lookup("nodeA"), Some("10.0.0.5".parse().unwrap()));
        assert_eq!(snap.get("nodeA").unwrap().engine_port, 2375);
        assert_eq!(snap.lookup("nodeB"), None);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let snap = TopologySnapshot::from_records(
            3,
            vec![record("nodeA", "10.0.0.5"), record("nodeA", "10.0.0.9")],
        );
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.lookup("nodeA"), Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn records_are_sorted() {
        let snap = TopologySnapshot::from_records(
            1,
            vec![record("nodeC", "10.0.0.7"), record("nodeA", "10.0.0.5"), record("nodeB", "10.0.0.6")],
        );
        let ids: Vec<&str> = snap.records().iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(ids, vec!["nodeA", "nodeB", "nodeC"]);
    }
}
