//! Conversion from placement requests to engine create bodies.

use swarmspawn_core::PlacementRequest;
use swarmspawn_core::config::DEFAULT_CONTAINER_PORT;
use swarmspawn_engine::{ContainerConfig, EmptyObject, HostConfig, PortBinding};

/// Build the engine create body for an (already defaulted) request.
///
/// The session port is exposed and bound to `bind_ip` with an empty host
/// port, leaving the engine to choose a free port on whichever node it
/// places the container on.
pub fn request_to_container_config(request: &PlacementRequest, bind_ip: &str) -> ContainerConfig {
    let port_key = format!(
        "{}/tcp",
        request.container_port.unwrap_or(DEFAULT_CONTAINER_PORT)
    );

    let mut config = ContainerConfig {
        image: request.image.clone(),
        env: request
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect(),
        working_dir: request.working_dir.clone(),
        exposed_ports: Default::default(),
        host_config: HostConfig {
            memory: request.resource_limits.memory_bytes,
            cpu_shares: request.resource_limits.cpu_shares,
            port_bindings: Default::default(),
        },
    };

    config.exposed_ports.insert(port_key.clone(), EmptyObject {});
    config.host_config.port_bindings.insert(
        port_key,
        vec![PortBinding {
            host_ip: bind_ip.to_string(),
            host_port: String::new(),
        }],
    );
    config
}
