//! swarmspawn-engine — client for the container orchestration engine.
//!
//! Speaks the engine's REST API (Docker/Swarm compatible) over HTTP/1.1,
//! either on a TCP address or a Unix socket. Only the handful of calls a
//! session spawn needs are implemented.
//!
//! # Components
//!
//! - **`api`** — the [`EngineApi`] seam every other crate talks through
//! - **`client`** — the hyper-backed [`EngineClient`]
//! - **`endpoint`** — `tcp://` / `unix://` endpoint parsing
//! - **`wire`** — JSON request/response bodies
//! - **`fake`** — scripted in-memory engine (feature `fake`)

pub mod api;
pub mod client;
pub mod endpoint;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod wire;

pub use api::{EngineApi, EngineFuture};
pub use client::EngineClient;
pub use endpoint::EngineEndpoint;
pub use error::{EngineError, EngineResult};
pub use wire::*;
