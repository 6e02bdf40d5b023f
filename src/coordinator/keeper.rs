//! The coordinator main loop.
//!
//! One iteration:
//! 1. terminate flag → exit
//! 2. reload-config flag → re-read tunables
//! 3. reload-registry flag → rebuild the node cache and targets
//! 4. heartbeat deadline passed → probe and advance the state machine
//! 5. sleep until the next deadline or a relay wake-up
//!
//! Probes and promotion run inline; both are bounded, so the loop cannot
//! hang on one target.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::loader::load_config;
use crate::config::KeeperConfig;
use crate::coordinator::promotion::PromotionController;
use crate::coordinator::relay::{RelayFlag, SignalRelay};
use crate::coordinator::status::{CoordinatorStatus, KeeperRole, MasterState, StandbyState, StandbyStep, Status};
use crate::error::{Error, Result};
use crate::heartbeat::HeartbeatProber;
use crate::node::{deadline_after, NodeClient, ProbeOutcome};
use crate::observability::metrics;
use crate::registry::{Node, Role, SyncState, TopologyRegistry};

/// Read-only view of the coordinator published for the admin API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusSnapshot {
    pub node_name: String,
    pub role: KeeperRole,
    pub substate: &'static str,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub target: Option<String>,
}

impl StatusSnapshot {
    pub fn initial(node_name: &str, role: KeeperRole) -> Self {
        Self {
            node_name: node_name.to_string(),
            role,
            substate: "ready",
            consecutive_failures: 0,
            failure_threshold: 0,
            target: None,
        }
    }
}

/// Ask the local server whether it is a replica.
pub async fn detect_role(client: &dyn NodeClient, local_target: &str) -> Result<KeeperRole> {
    match client.is_in_recovery(local_target).await {
        Ok(true) => Ok(KeeperRole::Standby),
        Ok(false) => Ok(KeeperRole::Master),
        Err(e) => Err(Error::Startup(format!(
            "cannot determine role of local server {}: {}",
            local_target, e
        ))),
    }
}

pub struct Coordinator {
    config: Arc<ArcSwap<KeeperConfig>>,
    config_path: Option<PathBuf>,
    registry: Arc<TopologyRegistry>,
    prober: HeartbeatProber,
    promotion: PromotionController,
    relay: Arc<SignalRelay>,
    status: CoordinatorStatus,
    nodes: Vec<Node>,
    published: Arc<ArcSwap<StatusSnapshot>>,
    next_heartbeat: Instant,
}

impl Coordinator {
    pub fn new(
        role: KeeperRole,
        config: Arc<ArcSwap<KeeperConfig>>,
        registry: Arc<TopologyRegistry>,
        client: Arc<dyn NodeClient>,
        relay: Arc<SignalRelay>,
    ) -> Self {
        let current = config.load_full();
        let published = Arc::new(ArcSwap::from_pointee(StatusSnapshot::initial(&current.node.name, role)));
        Self {
            promotion: PromotionController::new(client.clone(), current.node.local_target.clone()),
            prober: HeartbeatProber::new(client),
            config,
            config_path: None,
            registry,
            relay,
            status: CoordinatorStatus::new(role),
            nodes: Vec::new(),
            published,
            next_heartbeat: Instant::now(),
        }
    }

    /// File re-read when the reload-config flag is raised.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Shared snapshot cell, updated after every state change.
    pub fn status_feed(&self) -> Arc<ArcSwap<StatusSnapshot>> {
        self.published.clone()
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!(
            node = %self.config.load().node.name,
            role = ?self.status.role(),
            "Coordinator starting"
        );
        metrics::set_role(self.status.role() == KeeperRole::Master);
        self.reload_registry().await;

        loop {
            match self.relay.next_pending() {
                Some(RelayFlag::Terminate) => {
                    tracing::info!("Coordinator received termination request, exiting loop");
                    break;
                }
                Some(RelayFlag::ReloadConfig) => {
                    self.reload_config();
                    continue;
                }
                Some(RelayFlag::ReloadRegistry) => {
                    self.reload_registry().await;
                    continue;
                }
                None => {}
            }

            if Instant::now() >= self.next_heartbeat {
                self.heartbeat().await;
                self.next_heartbeat = deadline_after(self.config.load().heartbeat.interval());
            }

            self.relay.wait_until(self.next_heartbeat).await;
        }

        Ok(())
    }

    fn reload_config(&mut self) {
        let Some(path) = &self.config_path else {
            tracing::debug!("No config file to reload");
            return;
        };

        match load_config(path) {
            Ok(incoming) => {
                let current = self.config.load_full();
                let (next, ignored) = current.with_reloaded(incoming);
                for section in ignored {
                    tracing::warn!(section = section, "Change requires a restart, ignored");
                }
                tracing::info!(
                    interval_secs = next.heartbeat.interval_secs,
                    failure_threshold = next.heartbeat.failure_threshold,
                    "Configuration reloaded"
                );
                let sooner = deadline_after(next.heartbeat.interval());
                if sooner < self.next_heartbeat {
                    self.next_heartbeat = sooner;
                }
                self.config.store(Arc::new(next));
                self.publish();
            }
            Err(e) => {
                tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
            }
        }
    }

    async fn reload_registry(&mut self) {
        if self.status.role() == KeeperRole::Master {
            // Picks up sync setting changes made on the server directly.
            if let Err(e) = self.registry.reconcile().await {
                tracing::warn!(error = %e, "Registry reconciliation failed");
            }
        }

        match self.registry.list().await {
            Ok(nodes) => {
                metrics::set_registry_nodes(nodes.len());
                self.nodes = nodes;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registry reload failed, keeping cached view");
                return;
            }
        }

        match self.status.status {
            // The failure episode already ended in a promotion attempt.
            Status::Standby(StandbyState::Alone) => {}
            Status::Standby(_) => {
                let target = self.standby_target();
                if self.status.set_target(target) {
                    match &self.status.target {
                        Some(node) => tracing::info!(
                            primary = %node.name,
                            target = %node.connection_target,
                            "Monitoring primary"
                        ),
                        None => tracing::warn!("No primary known to monitor"),
                    }
                }
            }
            Status::Master(_) => {
                self.next_heartbeat = Instant::now();
            }
        }
        self.publish();
    }

    /// Registry primary if it is another node, else the configured one.
    fn standby_target(&self) -> Option<Node> {
        if let Some(primary) = self.nodes.iter().find(|n| n.is_primary() && !n.is_self) {
            return Some(primary.clone());
        }
        self.config.load().node.primary_target.as_ref().map(|target| Node {
            sequence_number: 0,
            name: "primary".to_string(),
            connection_target: target.clone(),
            role: Role::Primary,
            sync_state: SyncState::Unconfigured,
            is_self: false,
        })
    }

    async fn heartbeat(&mut self) {
        let config = self.config.load_full();
        match self.status.status {
            Status::Standby(StandbyState::Alone) => {
                tracing::debug!("Alone after failed promotion, awaiting operator");
            }
            Status::Standby(_) => self.standby_heartbeat(&config).await,
            Status::Master(_) => self.master_heartbeat(&config).await,
        }
        self.publish();
    }

    async fn standby_heartbeat(&mut self, config: &KeeperConfig) {
        let Some(target) = self.status.target.clone() else {
            tracing::warn!("No primary to monitor");
            return;
        };

        let threshold = config.heartbeat.failure_threshold;
        let outcome = self
            .prober
            .probe(&target.connection_target, config.heartbeat.timeout())
            .await;

        match self.status.record_standby_probe(outcome, threshold) {
            StandbyStep::Connected => {
                tracing::info!(primary = %target.name, "Connected to primary");
            }
            StandbyStep::Unchanged if !outcome.is_alive() => {
                tracing::warn!(
                    primary = %target.name,
                    failures = self.status.consecutive_failures,
                    threshold = threshold,
                    "Primary missed a heartbeat"
                );
            }
            StandbyStep::Unchanged => {}
            StandbyStep::Promote => {
                tracing::error!(
                    primary = %target.name,
                    failures = self.status.consecutive_failures,
                    "Primary unavailable, starting promotion"
                );
                metrics::set_consecutive_failures(self.status.consecutive_failures);
                self.promote(config).await;
            }
        }
        metrics::set_consecutive_failures(self.status.consecutive_failures);
    }

    async fn promote(&mut self, config: &KeeperConfig) {
        match self.promotion.execute(&config.promotion).await {
            Ok(_promoted) => {
                metrics::record_promotion(true);
                metrics::set_role(true);
                self.status.promotion_confirmed();
                tracing::info!(node = %config.node.name, "Promotion confirmed, continuing as master");

                if let Err(e) = self.registry.mark_primary(&config.node.name).await {
                    tracing::warn!(error = %e, "Could not record new primary in registry");
                }
                self.next_heartbeat = Instant::now();
            }
            Err(e) => {
                metrics::record_promotion(false);
                tracing::error!(
                    error = %e,
                    "Promotion failed; staying alone without retry, operator intervention required"
                );
            }
        }
    }

    async fn master_heartbeat(&mut self, config: &KeeperConfig) {
        let candidates: Vec<Node> = self
            .nodes
            .iter()
            .filter(|n| n.is_sync_standby() && !n.is_self)
            .cloned()
            .collect();

        let reachable = self
            .probe_all(&candidates, config)
            .await
            .into_iter()
            .zip(&candidates)
            .find(|(outcome, _)| outcome.is_alive())
            .map(|(_, node)| node.clone());

        let alive = reachable.is_some();
        self.status.set_target(reachable.or_else(|| candidates.first().cloned()));
        match self.status.record_master_health(alive) {
            Some(MasterState::Connected) => tracing::info!(
                standby = ?self.status.target.as_ref().map(|n| &n.name),
                "Synchronous standby connected"
            ),
            Some(MasterState::Async) => tracing::warn!(
                configured = candidates.len(),
                "No synchronous standby reachable, replication is asynchronous"
            ),
            Some(MasterState::Ready) | None => {}
        }
    }

    /// Probe every candidate at once so one round costs a single timeout.
    /// Results come back in candidate order.
    async fn probe_all(&self, candidates: &[Node], config: &KeeperConfig) -> Vec<ProbeOutcome> {
        let timeout = config.heartbeat.timeout();
        let mut probes = JoinSet::new();
        for (index, node) in candidates.iter().enumerate() {
            let prober = self.prober.clone();
            let target = node.connection_target.clone();
            probes.spawn(async move { (index, prober.probe(&target, timeout).await) });
        }

        let mut outcomes = vec![ProbeOutcome::Unreachable; candidates.len()];
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = outcome,
                Err(e) => tracing::warn!(error = %e, "Standby probe task failed"),
            }
        }
        outcomes
    }

    fn publish(&self) {
        let config = self.config.load();
        self.published.store(Arc::new(StatusSnapshot {
            node_name: config.node.name.clone(),
            role: self.status.role(),
            substate: self.status.status.substate(),
            consecutive_failures: self.status.consecutive_failures,
            failure_threshold: config.heartbeat.failure_threshold,
            target: self.status.target.as_ref().map(|n| n.connection_target.clone()),
        }));
    }
}
