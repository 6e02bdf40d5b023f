//! keeperd: failover coordinator daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   signals ─┐            ┌──────────────────────────────┐
//!   watcher ─┼─▶ relay ──▶│        coordinator loop       │── promote ──▶ local server
//!   admin  ──┘            │  heartbeat ▶ status machine   │
//!     │                   └──────────────┬───────────────┘
//!     │                                  │ probe
//!     ▼                                  ▼
//!  topology registry (file)        primary / sync standbys
//! ```

use arc_swap::ArcSwap;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use failover_keeper::admin::{self, AdminState};
use failover_keeper::config::loader::load_config;
use failover_keeper::config::watcher::ConfigWatcher;
use failover_keeper::coordinator::{detect_role, Coordinator, KeeperRole, SignalRelay};
use failover_keeper::heartbeat::HeartbeatProber;
use failover_keeper::lifecycle::{signals, Registration, RegistrationRecord, Shutdown};
use failover_keeper::node::{AgentClient, NodeClient};
use failover_keeper::observability::{logging, metrics};
use failover_keeper::registry::{FileStore, TopologyRegistry};
use failover_keeper::Error;

#[derive(Parser)]
#[command(name = "keeperd")]
#[command(about = "Failover coordinator for a primary/replica database cluster", long_about = None)]
struct Cli {
    /// Path to the keeper configuration file.
    #[arg(short, long, default_value = "keeper.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("keeperd: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        node = %config.node.name,
        config = %cli.config.display(),
        "keeperd v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client: Arc<dyn NodeClient> = Arc::new(AgentClient::new(config.heartbeat.timeout()));
    let relay = Arc::new(SignalRelay::new());
    let registry = Arc::new(TopologyRegistry::new(
        FileStore::new(config.registry.path.clone()),
        client.clone(),
        relay.clone(),
        config.node.name.clone(),
        config.heartbeat.timeout(),
    ));

    let role = detect_role(client.as_ref(), &config.node.local_target).await?;
    if role == KeeperRole::Standby && config.node.primary_target.is_none() {
        return Err(Error::Startup("node.primary_target is required when the local server is a replica".into()).into());
    }
    tracing::info!(role = ?role, local_target = %config.node.local_target, "Local server role detected");

    let shared_config = Arc::new(ArcSwap::from_pointee(config.clone()));
    let coordinator = Coordinator::new(role, shared_config.clone(), registry.clone(), client.clone(), relay.clone())
        .with_config_path(cli.config.clone());

    let admin_address = config.admin.enabled.then(|| config.admin.bind_address.clone());
    let record = RegistrationRecord::for_current_process(&config.node.name, admin_address);
    let _registration = Registration::publish(&config.lifecycle.state_dir, &record)?;

    let signal_task = signals::install(relay.clone())?;

    let _watcher = match ConfigWatcher::new(&cli.config, relay.clone()).run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, reload only via SIGHUP");
            None
        }
    };

    let shutdown = Shutdown::new();
    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            registry,
            prober: HeartbeatProber::new(client),
            relay,
            status: coordinator.status_feed(),
            config: shared_config,
        };
        Some(tokio::spawn(admin::serve(listener, state, shutdown.clone())))
    } else {
        None
    };

    let outcome = coordinator.run().await;

    shutdown.trigger();
    signal_task.abort();
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
            Ok(Ok(())) => {}
        }
    }

    outcome?;
    tracing::info!("Shutdown complete");
    Ok(())
}
