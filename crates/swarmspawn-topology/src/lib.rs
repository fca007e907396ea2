//! swarmspawn-topology — which nodes exist and how to reach them.
//!
//! The cache keeps the latest [`TopologySnapshot`] behind an `Arc` and
//! swaps it wholesale on refresh, so readers never observe a half-built
//! view and in-flight spawns keep the snapshot they started with.
//!
//! # Architecture
//!
//! ```text
//! ClusterTopologyCache
//!   ├── refresh() ──► TopologySource::list_nodes()
//!   │                   ├── EngineInfoSource  (GET /info, DriverStatus lines)
//!   │                   └── StaticTopologySource (config file)
//!   ├── snapshot() → Arc<TopologySnapshot>
//!   └── lookup(node_id) → Option<IpAddr>
//! ```

pub mod cache;
pub mod error;
pub mod snapshot;
pub mod source;

pub use cache::ClusterTopologyCache;
pub use error::{TopologyError, TopologyResult};
pub use snapshot::{NodeRecord, TopologySnapshot};
pub use source::{
    EngineInfoSource, SourceFuture, StaticTopologySource, TopologySource, parse_driver_status,
};
