//! JSON bodies exchanged with the engine.
//!
//! Field names follow the engine's PascalCase API. Unknown fields are
//! ignored; fields we do not strictly need are optional so that older
//! Swarm managers and plain engines both decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── GET /info ─────────────────────────────────────────────────────

/// Subset of the engine's `/info` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EngineInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub server_version: Option<String>,
    /// Free-text `[label, value]` pairs; a Swarm manager lists one pair per
    /// node (`["node-1", "10.0.0.5:2375"]`) among its own metadata lines.
    #[serde(default)]
    pub driver_status: Option<Vec<Vec<String>>>,
}

impl EngineInfo {
    /// Iterate well-formed `(label, value)` pairs of `DriverStatus`.
    pub fn status_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.driver_status
            .iter()
            .flatten()
            .filter(|entry| entry.len() >= 2)
            .map(|entry| (entry[0].as_str(), entry[1].as_str()))
    }
}

// ── GET /containers/json ──────────────────────────────────────────

/// One entry of the container listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    /// On a Swarm manager each name is `/<node>/<container>`.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Machine state: `created`, `running`, `exited`, ...
    #[serde(default)]
    pub state: Option<String>,
    /// Human status, e.g. `Up 3 minutes`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
}

impl ContainerSummary {
    /// Whether `id` names this container, either fully or by a short-id
    /// prefix of at least 12 characters, as the engine prints them.
    pub fn matches_id(&self, id: &str) -> bool {
        self.id == id || (id.len() >= 12 && self.id.starts_with(id))
    }

    /// Find the container `id` names in a listing. An exact id wins; a
    /// short-id prefix must match exactly one container.
    pub fn find<'a>(listing: &'a [ContainerSummary], id: &str) -> Option<&'a ContainerSummary> {
        if let Some(exact) = listing.iter().find(|c| c.id == id) {
            return Some(exact);
        }
        let mut matches = listing.iter().filter(|c| c.matches_id(id));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.as_deref() == Some("running")
    }

    /// Host port published for `private_port`/tcp, if any.
    pub fn public_port(&self, private_port: u16) -> Option<u16> {
        self.ports
            .iter()
            .filter(|p| p.private_port == private_port)
            .filter(|p| p.kind.as_deref().is_none_or(|k| k == "tcp"))
            .find_map(|p| p.public_port)
    }
}

/// A port entry in the container listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortMapping {
    #[serde(rename = "IP", default)]
    pub ip: Option<String>,
    pub private_port: u16,
    #[serde(default)]
    pub public_port: Option<u16>,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
}

// ── POST /containers/create ───────────────────────────────────────

/// Create-container request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    pub image: String,
    /// `KEY=value` strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// `"8888/tcp" → {}`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exposed_ports: BTreeMap<String, EmptyObject>,
    pub host_config: HostConfig,
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyObject {}

/// Host-side settings of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    /// Memory limit in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub port_bindings: BTreeMap<String, Vec<PortBinding>>,
}

/// Host binding for an exposed port. An empty `HostPort` lets the engine
/// pick a free port on the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    pub host_ip: String,
    pub host_port: String,
}

/// Create-container response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedContainer {
    pub id: String,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    /// Present when a Swarm manager reports the chosen node at create time.
    #[serde(default)]
    pub node: Option<NodeRef>,
}

/// Node descriptor some Swarm managers attach to container objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeRef {
    pub name: String,
    #[serde(rename = "IP", default)]
    pub ip: Option<String>,
}

// ── Errors ────────────────────────────────────────────────────────

/// Error body returned by the engine on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
