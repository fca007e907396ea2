//! The topology cache.

use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::TopologyResult;
use crate::snapshot::TopologySnapshot;
use crate::source::TopologySource;

/// Holds the latest [`TopologySnapshot`] and refreshes it from a source.
///
/// The lock only guards the pointer swap; it is never held across the
/// source query, so lookups are not blocked by a slow refresh.
pub struct ClusterTopologyCache {
    source: Arc<dyn TopologySource>,
    current: RwLock<Arc<TopologySnapshot>>,
}

impl ClusterTopologyCache {
    /// Create a cache holding the empty, version-0 snapshot.
    pub fn new(source: Arc<dyn TopologySource>) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(TopologySnapshot::empty())),
        }
    }

    /// Query the source and publish a new snapshot.
    ///
    /// On failure the previous snapshot remains current and the error is
    /// returned to the caller.
    pub async fn refresh(&self) -> TopologyResult<Arc<TopologySnapshot>> {
        let records = match self.source.list_nodes().await {
            Ok(records) => records,
            Err(e) => {
                warn!(source = self.source.kind(), error = %e, "topology refresh failed");
                return Err(e);
            }
        };

        let snapshot = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let next = Arc::new(TopologySnapshot::from_records(current.version() + 1, records));
            *current = Arc::clone(&next);
            next
        };

        info!(
            source = self.source.kind(),
            version = snapshot.version(),
            nodes = snapshot.len(),
            "topology refreshed"
        );
        for record in snapshot.records() {
            debug!(node_id = %record.node_id, address = %record.address, "topology node");
        }

        Ok(snapshot)
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<TopologySnapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Address of `node_id` in the latest snapshot.
    ///
    /// `None` before the first refresh and for nodes absent from the
    /// latest snapshot, regardless of what older snapshots contained.
    pub fn lookup(&self, node_id: &str) -> Option<IpAddr> {
        self.snapshot().lookup(node_id)
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }
}
