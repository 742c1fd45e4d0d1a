//! playgridd — the playgrid daemon.
//!
//! Single binary that assembles:
//! - Credential store (in memory)
//! - Cluster client (Kubernetes, or in-memory with `--dry-run`)
//! - Provisioner
//! - REST API
//!
//! # Usage
//!
//! ```text
//! playgridd serve --config /etc/playgrid/playgrid.toml --port 5001
//! ```

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use playgrid_core::ServiceConfig;

#[derive(Parser)]
#[command(name = "playgridd", about = "playgrid session provisioning daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the provisioning API.
    Serve {
        /// Path to playgrid.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to bind (overrides `server.bind`).
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides `server.port`).
        #[arg(long)]
        port: Option<u16>,

        /// Namespace for session objects (overrides `cluster.namespace`).
        #[arg(long)]
        namespace: Option<String>,

        /// Keep objects in memory instead of talking to a cluster.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the effective configuration as TOML.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,playgridd=debug,playgrid=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            bind,
            port,
            namespace,
            dry_run,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(namespace) = namespace {
                config.cluster.namespace = namespace;
            }
            config.validate()?;
            serve::run(config, dry_run).await
        }
        Command::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ServiceConfig> {
    match path {
        Some(path) => Ok(ServiceConfig::from_file(path)?),
        None => Ok(ServiceConfig::default()),
    }
}
