//! Domain types shared across swarmspawn crates.
//!
//! These describe one session spawn from request to reachable endpoint.
//! All types are serializable so the daemon can read requests from and
//! print results as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Identifier of a node in the cluster, as reported by the engine.
pub type NodeId = String;

/// Engine-assigned container id (full 64-char hex, or a unique prefix).
pub type ContainerId = String;

// ── Request ───────────────────────────────────────────────────────

/// Resource limits for a session container.
///
/// Absent fields are filled from configured defaults at placement time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory limit in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
    /// Relative CPU shares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<u64>,
}

/// Everything needed to place one session container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// Container name requested from the engine (e.g. `jupyter-alice`).
    pub session_name: String,
    /// Image reference to run.
    pub image: String,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    /// Working directory inside the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// The session owner's home directory.
    pub home_dir: String,
    /// Environment variables injected into the container.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Port the session server listens on inside the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_port: Option<u16>,
}

impl PlacementRequest {
    /// Create a request with no explicit limits, working dir, or port.
    pub fn new(session_name: &str, image: &str, home_dir: &str) -> Self {
        Self {
            session_name: session_name.to_string(),
            image: image.to_string(),
            resource_limits: ResourceLimits::default(),
            working_dir: None,
            home_dir: home_dir.to_string(),
            env: BTreeMap::new(),
            container_port: None,
        }
    }

    pub fn with_memory_bytes(mut self, bytes: u64) -> Self {
        self.resource_limits.memory_bytes = Some(bytes);
        self
    }

    pub fn with_working_dir(mut self, dir: &str) -> Self {
        self.working_dir = Some(dir.to_string());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_container_port(mut self, port: u16) -> Self {
        self.container_port = Some(port);
        self
    }
}

// ── Results ───────────────────────────────────────────────────────

/// Outcome of a successful create-and-start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub container_id: ContainerId,
    pub container_name: String,
    /// Node the engine reported at creation time, if it reported one.
    ///
    /// Usually absent; the address resolver is authoritative.
    pub assigned_node_id: Option<NodeId>,
}

/// Where a started session can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEndpoint {
    pub node_id: NodeId,
    pub ip: IpAddr,
    pub port: u16,
}

impl ResolvedEndpoint {
    /// `ip:port` form suitable for proxy routing tables.
    pub fn address(&self) -> String {
        std::net::SocketAddr::new(self.ip, self.port).to_string()
    }
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.node_id, self.address())
    }
}

/// Lifecycle status of a session container as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    /// Container exists but is not running; `status` is the engine's text.
    Exited { status: String },
    /// The engine does not list the container at all.
    Missing,
}

impl SessionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_fields() {
        let req = PlacementRequest::new("jupyter-alice", "notebook:latest", "/home/alice")
            .with_memory_bytes(512 * 1024 * 1024)
            .with_working_dir("/srv")
            .with_env("JPY_USER", "alice")
            .with_container_port(9999);

        assert_eq!(req.resource_limits.memory_bytes, Some(512 * 1024 * 1024));
        assert_eq!(req.working_dir.as_deref(), Some("/srv"));
        assert_eq!(req.env.get("JPY_USER").map(String::as_str), Some("alice"));
        assert_eq!(req.container_port, Some(9999));
    }

    #[test]
    fn request_parses_with_optional_fields_missing() {
        let json = r#"{
            "session_name": "jupyter-bob",
            "image": "notebook:latest",
            "home_dir": "/home/bob"
        }"#;
        let req: PlacementRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req, PlacementRequest::new("jupyter-bob", "notebook:latest", "/home/bob"));
    }

    #[test]
    fn endpoint_address_formats_v4_and_v6() {
        let v4 = ResolvedEndpoint {
            node_id: "nodeA".to_string(),
            ip: "10.0.0.5".parse().unwrap(),
            port: 32768,
        };
        assert_eq!(v4.address(), "10.0.0.5:32768");
        assert_eq!(v4.to_string(), "nodeA (10.0.0.5:32768)");

        let v6 = ResolvedEndpoint {
            node_id: "nodeB".to_string(),
            ip: "fd00::1".parse().unwrap(),
            port: 8888,
        };
        assert_eq!(v6.address(), "[fd00::1]:8888");
    }

    #[test]
    fn session_status_serializes_tagged() {
        let json = serde_json::to_string(&SessionStatus::Exited {
            status: "Exited (0) 2 minutes ago".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""state":"exited""#));
        assert!(!SessionStatus::Missing.is_running());
    }
}
