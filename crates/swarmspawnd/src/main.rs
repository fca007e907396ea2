//! swarmspawnd — operator entry point for swarmspawn.
//!
//! Wires the engine client, topology cache, and spawn coordinator from a
//! TOML config file and exposes the session lifecycle on the command line.
//!
//! # Usage
//!
//! ```text
//! swarmspawnd --config spawner.toml nodes
//! swarmspawnd --config spawner.toml spawn --name jupyter-alice --image notebook:latest --home /home/alice
//! swarmspawnd status <container-id>
//! swarmspawnd stop <container-id>
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod wiring;

#[derive(Parser)]
#[command(
    name = "swarmspawnd",
    about = "Node-aware session spawner for Swarm clusters",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the spawner config (TOML). Built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Engine endpoint, overriding the config (tcp://host:port or unix:///path).
    #[arg(long, global = true)]
    engine: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the cluster topology and print the nodes.
    Nodes,
    /// Start a session container and print its endpoint.
    Spawn {
        /// Container name, e.g. jupyter-alice.
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: String,
        /// Session home directory; the working directory unless overridden.
        #[arg(long)]
        home: String,
        /// Memory limit such as 512m or 2g.
        #[arg(long)]
        memory: Option<String>,
        #[arg(long)]
        working_dir: Option<String>,
        /// Port the session listens on inside the container.
        #[arg(long)]
        port: Option<u16>,
        /// Environment entries, KEY=VALUE. Repeatable.
        #[arg(short, long = "env")]
        env: Vec<String>,
    },
    /// Print whether a session container is running.
    Status { container_id: String },
    /// Stop and remove a session container.
    Stop { container_id: String },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,swarmspawnd=debug,swarmspawn=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = wiring::load_config(cli.config.as_deref(), cli.engine.as_deref())?;

    match cli.command {
        Command::Nodes => commands::nodes(&config).await,
        Command::Spawn {
            name,
            image,
            home,
            memory,
            working_dir,
            port,
            env,
        } => {
            let request = commands::build_request(
                &name,
                &image,
                &home,
                memory.as_deref(),
                working_dir.as_deref(),
                port,
                &env,
            )?;
            commands::spawn(&config, &request).await
        }
        Command::Status { container_id } => commands::status(&config, &container_id).await,
        Command::Stop { container_id } => commands::stop(&config, &container_id).await,
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
