//! Topology error types.

use thiserror::Error;

pub type TopologyResult<T> = Result<T, TopologyError>;

#[derive(Debug, Error)]
pub enum TopologyError {
    /// The inventory query failed; the previous snapshot stays current.
    #[error("topology unavailable: {0}")]
    Unavailable(String),

    #[error("invalid address {address:?} for node {node_id}")]
    InvalidAddress { node_id: String, address: String },

    #[error("node status pattern: {0}")]
    Pattern(#[from] regex::Error),
}
