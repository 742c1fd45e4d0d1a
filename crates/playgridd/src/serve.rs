//! Serve mode: wires the provisioner to a cluster and runs the REST API.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use playgrid_cluster::{ClusterClient, InMemoryCluster, KubeClusterClient};
use playgrid_core::ServiceConfig;
use playgrid_provision::Provisioner;
use playgrid_state::{CredentialStore, MaxAge};

const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 300;

pub async fn run(config: ServiceConfig, dry_run: bool) -> anyhow::Result<()> {
    info!("playgrid daemon starting");

    // ── Credential store ───────────────────────────────────────

    let max_age = config.credentials.max_age_secs.map(Duration::from_secs);
    let store = match max_age {
        Some(age) => {
            info!(max_age_secs = age.as_secs(), "credential retention enabled");
            CredentialStore::with_retention(Arc::new(MaxAge(age)))
        }
        None => {
            info!("credentials retained for the lifetime of the process");
            CredentialStore::new()
        }
    };

    // ── Cluster client ─────────────────────────────────────────

    let cluster: Arc<dyn ClusterClient> = if dry_run {
        warn!("dry run: objects are kept in memory, nothing reaches a cluster");
        Arc::new(InMemoryCluster::new())
    } else {
        let client = KubeClusterClient::try_default().await?;
        info!("kubernetes client initialized");
        Arc::new(client)
    };

    // ── Provisioner ────────────────────────────────────────────

    let provisioner = Arc::new(Provisioner::new(
        cluster,
        store.clone(),
        config.cluster.namespace.clone(),
        config.workload_template(),
    ));
    info!(namespace = %config.cluster.namespace, "provisioner initialized");

    // ── Background tasks ───────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let prune_handle = max_age.map(|_| {
        let interval = Duration::from_secs(
            config
                .credentials
                .prune_interval_secs
                .unwrap_or(DEFAULT_PRUNE_INTERVAL_SECS),
        );
        let store = store.clone();
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = store.prune().await;
                        if evicted > 0 {
                            info!(evicted, "pruned expired credentials");
                        } else {
                            debug!("credential prune: nothing expired");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    });

    // ── API server ─────────────────────────────────────────────

    let router = playgrid_api::build_router(provisioner);
    let listener =
        tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "API server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(handle) = prune_handle {
        let _ = handle.await;
    }

    info!("playgrid daemon stopped");
    Ok(())
}
