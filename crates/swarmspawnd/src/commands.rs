//! Subcommand implementations. Results go to stdout as JSON, logs to stderr.

use anyhow::{Context, Result, bail};
use tokio::sync::watch;
use tracing::{info, warn};

use swarmspawn_core::{PlacementRequest, SpawnerConfig, parse_memory_size};

use crate::wiring;

/// `nodes` — refresh once and print the snapshot.
pub async fn nodes(config: &SpawnerConfig) -> Result<()> {
    let engine = wiring::engine(config)?;
    let cache = wiring::topology(config, engine)?;
    let snapshot = cache.refresh().await.context("refreshing topology")?;

    println!("{}", serde_json::to_string_pretty(&snapshot.records())?);
    Ok(())
}

/// `spawn` — start a session; Ctrl-C abandons the spawn but still reports
/// the container id if one was created.
pub async fn spawn(config: &SpawnerConfig, request: &PlacementRequest) -> Result<()> {
    let coordinator = wiring::coordinator(config)?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling spawn");
            let _ = cancel_tx.send(true);
        }
    });

    match coordinator.start_with_cancel(request, cancel_rx).await {
        Ok(endpoint) => {
            println!("{}", serde_json::to_string_pretty(&endpoint)?);
            Ok(())
        }
        Err(failure) => {
            if let Some(id) = &failure.container_id {
                warn!(container_id = %id, "spawn left a container behind; remove it with `swarmspawnd stop {id}`");
            }
            let report = serde_json::json!({
                "session": &failure.session,
                "phase": failure.phase,
                "container_id": &failure.container_id,
                "error": failure.error.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Err(failure.into())
        }
    }
}

/// `status` — print the session's lifecycle status.
pub async fn status(config: &SpawnerConfig, container_id: &str) -> Result<()> {
    let coordinator = wiring::coordinator(config)?;
    let status = coordinator.poll(container_id).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// `stop` — stop and remove the session container.
pub async fn stop(config: &SpawnerConfig, container_id: &str) -> Result<()> {
    let coordinator = wiring::coordinator(config)?;
    coordinator.stop(container_id).await?;
    info!(container_id, "session stopped");
    Ok(())
}

/// Assemble a placement request from command-line values.
pub fn build_request(
    name: &str,
    image: &str,
    home: &str,
    memory: Option<&str>,
    working_dir: Option<&str>,
    port: Option<u16>,
    env: &[String],
) -> Result<PlacementRequest> {
    let mut request = PlacementRequest::new(name, image, home);

    if let Some(memory) = memory {
        request = request.with_memory_bytes(parse_memory_size(memory)?);
    }
    if let Some(dir) = working_dir {
        request = request.with_working_dir(dir);
    }
    if let Some(port) = port {
        request = request.with_container_port(port);
    }
    for entry in env {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("environment entry {entry:?} is not KEY=VALUE");
        };
        if key.is_empty() {
            bail!("environment entry {entry:?} has an empty key");
        }
        request = request.with_env(key, value);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_from_flags() {
        let request = build_request(
            "jupyter-alice",
            "notebook:latest",
            "/home/alice",
            Some("512m"),
            None,
            Some(9999),
            &["JPY_USER=alice".to_string(), "OPTS=a=b".to_string()],
        )
        .unwrap();

        assert_eq!(request.resource_limits.memory_bytes, Some(536_870_912));
        assert_eq!(request.working_dir, None);
        assert_eq!(request.container_port, Some(9999));
        assert_eq!(request.env["JPY_USER"], "alice");
        assert_eq!(request.env["OPTS"], "a=b");
    }

    #[test]
    fn bad_memory_is_rejected() {
        assert!(build_request("s1", "img", "/h", Some("lots"), None, None, &[]).is_err());
    }

    #[test]
    fn env_without_equals_is_rejected() {
        let err = build_request("s1", "img", "/h", None, None, None, &["JPY_USER".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("KEY=VALUE"));
    }
}
