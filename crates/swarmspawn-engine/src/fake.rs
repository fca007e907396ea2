//! Scripted in-memory engine for tests.
//!
//! Behaves like a Swarm manager: created containers are named
//! `/<node>/<name>`, get a published port per exposed port, and can be
//! kept out of the listing for a number of calls to reproduce the
//! placement-propagation race.

use std::sync::Mutex;
use std::time::Duration;

use crate::api::{EngineApi, EngineFuture};
use crate::error::EngineError;
use crate::wire::{
    ContainerConfig, ContainerSummary, CreatedContainer, EngineInfo, NodeRef, PortMapping,
};

const FIRST_PUBLIC_PORT: u16 = 32768;

#[derive(Debug)]
struct Entry {
    summary: ContainerSummary,
    /// Listings left during which this container is invisible.
    hidden_for: u32,
    config: Option<ContainerConfig>,
}

#[derive(Debug, Default)]
struct FakeState {
    info: Option<EngineInfo>,
    entries: Vec<Entry>,
    node: String,
    hide_new_for: u32,
    report_node_on_create: bool,
    fail_create: Option<String>,
    fail_start: Option<String>,
    next_id: u64,
    next_port: u16,
    calls: Vec<String>,
}

/// In-memory [`EngineApi`] implementation.
#[derive(Debug)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    /// An engine with no nodes that places everything on `node-1`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                info: Some(EngineInfo::default()),
                node: "node-1".to_string(),
                next_port: FIRST_PUBLIC_PORT,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake engine lock")
    }

    /// Replace `DriverStatus` with the given `(label, value)` pairs.
    pub fn set_driver_status(&self, pairs: &[(&str, &str)]) {
        let status = pairs
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect();
        self.lock().info = Some(EngineInfo {
            name: Some("fake-swarm".to_string()),
            server_version: Some("swarm/1.2.9".to_string()),
            driver_status: Some(status),
        });
    }

    /// Make `/info` fail (or succeed again with `false`).
    pub fn set_info_unavailable(&self, unavailable: bool) {
        let mut state = self.lock();
        if unavailable {
            state.info = None;
        } else if state.info.is_none() {
            state.info = Some(EngineInfo::default());
        }
    }

    /// Node that subsequent creates land on.
    pub fn place_on(&self, node: &str) {
        self.lock().node = node.to_string();
    }

    /// Keep newly created containers out of the next `listings` listings.
    pub fn hide_new_containers_for(&self, listings: u32) {
        self.lock().hide_new_for = listings;
    }

    /// Attach the chosen node to create responses.
    pub fn report_node_on_create(&self, report: bool) {
        self.lock().report_node_on_create = report;
    }

    pub fn fail_create(&self, reason: &str) {
        self.lock().fail_create = Some(reason.to_string());
    }

    pub fn fail_start(&self, reason: &str) {
        self.lock().fail_start = Some(reason.to_string());
    }

    /// Insert a pre-existing, immediately visible container.
    pub fn add_container(&self, summary: ContainerSummary) {
        self.lock().entries.push(Entry {
            summary,
            hidden_for: 0,
            config: None,
        });
    }

    /// Every container, visible or not.
    pub fn containers(&self) -> Vec<ContainerSummary> {
        self.lock().entries.iter().map(|e| e.summary.clone()).collect()
    }

    /// The create body the engine received for a container.
    pub fn config_of(&self, id: &str) -> Option<ContainerConfig> {
        self.lock()
            .entries
            .iter()
            .find(|e| e.summary.id == id)
            .and_then(|e| e.config.clone())
    }

    /// Log of calls, e.g. `["info", "create jupyter-alice", "start <id>"]`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls whose log line starts with `op`.
    pub fn count(&self, op: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }
}

fn not_found(id: &str) -> EngineError {
    EngineError::NotFound(format!("No such container: {id}"))
}

impl EngineApi for FakeEngine {
    fn info(&self) -> EngineFuture<'_, EngineInfo> {
        let mut state = self.lock();
        state.calls.push("info".to_string());
        let result = state.info.clone().ok_or_else(|| EngineError::Status {
            status: 500,
            message: "cannot reach cluster".to_string(),
        });
        Box::pin(async move { result })
    }

    fn list_containers(&self) -> EngineFuture<'_, Vec<ContainerSummary>> {
        let mut state = self.lock();
        state.calls.push("list".to_string());
        let mut visible = Vec::new();
        for entry in &mut state.entries {
            if entry.hidden_for > 0 {
                entry.hidden_for -= 1;
            } else {
                visible.push(entry.summary.clone());
            }
        }
        Box::pin(async move { Ok(visible) })
    }

    fn create_container<'a>(
        &'a self,
        name: &'a str,
        config: &'a ContainerConfig,
    ) -> EngineFuture<'a, CreatedContainer> {
        let mut state = self.lock();
        state.calls.push(format!("create {name}"));

        if let Some(reason) = state.fail_create.clone() {
            return Box::pin(async move {
                Err(EngineError::Status {
                    status: 500,
                    message: reason,
                })
            });
        }

        state.next_id += 1;
        let id = format!("{:064x}", 0xc0ffee_u64 * 1000 + state.next_id);

        let mut ports = Vec::new();
        for key in config.exposed_ports.keys() {
            if let Some(private_port) = key.split('/').next().and_then(|p| p.parse().ok()) {
                ports.push(PortMapping {
                    ip: Some("0.0.0.0".to_string()),
                    private_port,
                    public_port: Some(state.next_port),
                    kind: Some("tcp".to_string()),
                });
                state.next_port += 1;
            }
        }

        let node = state.node.clone();
        let hidden_for = state.hide_new_for;
        state.entries.push(Entry {
            summary: ContainerSummary {
                id: id.clone(),
                names: vec![format!("/{node}/{name}")],
                image: Some(config.image.clone()),
                state: Some("created".to_string()),
                status: Some("Created".to_string()),
                ports,
            },
            hidden_for,
            config: Some(config.clone()),
        });

        let created = CreatedContainer {
            id,
            warnings: None,
            node: state.report_node_on_create.then(|| NodeRef { name: node, ip: None }),
        };
        Box::pin(async move { Ok(created) })
    }

    fn start_container<'a>(&'a self, id: &'a str) -> EngineFuture<'a, ()> {
        let mut state = self.lock();
        state.calls.push(format!("start {id}"));

        let result = if let Some(reason) = state.fail_start.clone() {
            Err(EngineError::Status {
                status: 500,
                message: reason,
            })
        } else {
            match state.entries.iter_mut().find(|e| e.summary.matches_id(id)) {
                Some(entry) => {
                    entry.summary.state = Some("running".to_string());
                    entry.summary.status = Some("Up 1 second".to_string());
                    Ok(())
                }
                None => Err(not_found(id)),
            }
        };
        Box::pin(async move { result })
    }

    fn stop_container<'a>(&'a self, id: &'a str, _grace: Duration) -> EngineFuture<'a, ()> {
        let mut state = self.lock();
        state.calls.push(format!("stop {id}"));

        let result = match state.entries.iter_mut().find(|e| e.summary.matches_id(id)) {
            Some(entry) => {
                entry.summary.state = Some("exited".to_string());
                entry.summary.status = Some("Exited (0) 1 second ago".to_string());
                Ok(())
            }
            None => Err(not_found(id)),
        };
        Box::pin(async move { result })
    }

    fn remove_container<'a>(&'a self, id: &'a str) -> EngineFuture<'a, ()> {
        let mut state = self.lock();
        state.calls.push(format!("remove {id}"));

        let before = state.entries.len();
        state.entries.retain(|e| !e.summary.matches_id(id));
        let result = if state.entries.len() < before {
            Ok(())
        } else {
            Err(not_found(id))
        };
        Box::pin(async move { result })
    }
}
