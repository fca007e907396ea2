//! swarmspawn-placement — put a session container on the cluster and
//! find out where it went.
//!
//! Placement itself is the engine's decision. This crate prepares the
//! request (applying deployment defaults), submits it, and afterwards
//! maps the engine's answer back to a routable address.
//!
//! # Components
//!
//! - **`defaults`** — additive defaulting of memory, working dir, port
//! - **`convert`** — request → engine create body
//! - **`client`** — [`PlacementClient`]: create + start, no retries
//! - **`resolver`** — [`AddressResolver`]: inventory scan → node → IP

pub mod client;
pub mod convert;
pub mod defaults;
pub mod error;
pub mod resolver;

pub use client::PlacementClient;
pub use convert::request_to_container_config;
pub use defaults::PlacementDefaults;
pub use error::{PlacementError, ResolveError};
pub use resolver::{AddressResolver, parse_node_name, resolve_in_listing, status_in_listing};
