//! swarmspawn-core — shared types for node-aware session placement.
//!
//! Every other swarmspawn crate depends on this one for the request and
//! result types that flow through a spawn, and for the TOML configuration
//! that drives the daemon.

pub mod config;
pub mod types;
pub mod units;

pub use config::SpawnerConfig;
pub use types::*;
pub use units::{UnitError, parse_duration, parse_memory_size};
