//! Topology registry: membership, roles and sync-state reconciliation.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::coordinator::relay::{RelayFlag, SignalRelay};
use crate::error::{Error, Result};
use crate::node::NodeClient;
use crate::observability::metrics;
use crate::registry::node::{Node, Role, SyncState};
use crate::registry::replication::ReplicationConfig;
use crate::registry::store::{FileStore, RegistryTable};

pub struct TopologyRegistry {
    /// Serializes every read-modify-write of the table.
    store: Mutex<FileStore>,
    client: Arc<dyn NodeClient>,
    relay: Arc<SignalRelay>,
    self_name: String,
    probe_timeout: Duration,
}

impl TopologyRegistry {
    pub fn new(
        store: FileStore,
        client: Arc<dyn NodeClient>,
        relay: Arc<SignalRelay>,
        self_name: impl Into<String>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            client,
            relay,
            self_name: self_name.into(),
            probe_timeout,
        }
    }

    /// Register a reachable node. The first node becomes the primary.
    pub async fn add(&self, name: &str, target: &str) -> Result<Node> {
        let outcome = self.client.probe(target, self.probe_timeout).await;
        if !outcome.is_alive() {
            tracing::warn!(node = %name, target = %target, outcome = %outcome, "Refusing to register unreachable node");
            return Err(Error::NodeUnreachable {
                target: target.to_string(),
                outcome: outcome.to_string(),
            });
        }

        let store = self.store.lock().await;
        let mut table = store.load()?;
        if table.contains(name) {
            return Err(Error::DuplicateNode(name.to_string()));
        }

        let node = if table.nodes.is_empty() {
            table.insert(name, target, Role::Primary, SyncState::Unconfigured)
        } else {
            let replication = self.replication_config(&table).await;
            let sync_state = match &replication {
                Some(config) if config.is_synchronous(name) => SyncState::Sync,
                _ => SyncState::Async,
            };
            let node = table.insert(name, target, Role::Standby, sync_state);
            Self::apply_sync_states(&mut table, replication.as_ref());
            node
        };

        store.save(&table)?;
        drop(store);

        tracing::info!(
            node = %node.name,
            target = %node.connection_target,
            role = %node.role,
            sync_state = %node.sync_state,
            sequence = node.sequence_number,
            "Node registered"
        );
        metrics::set_registry_nodes(table.nodes.len());
        self.relay.raise(RelayFlag::ReloadRegistry);
        Ok(self.tag_self(node))
    }

    /// Remove the row called `name`.
    pub async fn remove(&self, name: &str) -> Result<Node> {
        self.remove_where(|n| n.name == name, || name.to_string()).await
    }

    /// Remove the row with sequence number `seq`.
    pub async fn remove_by_sequence(&self, seq: u64) -> Result<Node> {
        self.remove_where(|n| n.sequence_number == seq, || format!("#{}", seq)).await
    }

    async fn remove_where<F, L>(&self, matches: F, label: L) -> Result<Node>
    where
        F: Fn(&Node) -> bool,
        L: Fn() -> String,
    {
        let store = self.store.lock().await;
        let mut table = store.load()?;

        let index = table
            .nodes
            .iter()
            .position(|n| matches(n))
            .ok_or_else(|| Error::NodeNotFound(label()))?;

        if table.nodes[index].is_primary() && table.nodes.len() > 1 {
            return Err(Error::PrimaryRemoval(table.nodes[index].name.clone()));
        }

        let removed = table.nodes.remove(index);
        let replication = self.replication_config(&table).await;
        Self::apply_sync_states(&mut table, replication.as_ref());
        store.save(&table)?;
        drop(store);

        tracing::info!(node = %removed.name, sequence = removed.sequence_number, "Node removed");
        metrics::set_registry_nodes(table.nodes.len());
        self.relay.raise(RelayFlag::ReloadRegistry);
        Ok(self.tag_self(removed))
    }

    /// Snapshot ordered by sequence number.
    pub async fn list(&self) -> Result<Vec<Node>> {
        let store = self.store.lock().await;
        let table = store.load()?;
        Ok(table.nodes.into_iter().map(|n| self.tag_self(n)).collect())
    }

    /// Re-derive every standby's sync state from the primary's setting.
    pub async fn reconcile(&self) -> Result<()> {
        let store = self.store.lock().await;
        let mut table = store.load()?;
        let replication = self.replication_config(&table).await;
        if Self::apply_sync_states(&mut table, replication.as_ref()) {
            store.save(&table)?;
            drop(store);
            self.relay.raise(RelayFlag::ReloadRegistry);
        }
        Ok(())
    }

    /// Record `name` as the new primary; the old primary becomes a standby.
    pub async fn mark_primary(&self, name: &str) -> Result<()> {
        let store = self.store.lock().await;
        let mut table = store.load()?;
        if !table.contains(name) {
            return Err(Error::NodeNotFound(name.to_string()));
        }

        for node in table.nodes.iter_mut() {
            if node.name == name {
                node.role = Role::Primary;
                node.sync_state = SyncState::Unconfigured;
            } else if node.is_primary() {
                node.role = Role::Standby;
                node.sync_state = SyncState::Async;
            }
        }

        let replication = self.replication_config(&table).await;
        Self::apply_sync_states(&mut table, replication.as_ref());
        store.save(&table)?;
        drop(store);

        tracing::info!(node = %name, "Registry primary updated");
        self.relay.raise(RelayFlag::ReloadRegistry);
        Ok(())
    }

    /// Read the primary's synchronous standby setting, if it can be reached.
    async fn replication_config(&self, table: &RegistryTable) -> Option<ReplicationConfig> {
        let primary = table.primary()?;
        match self.client.synchronous_standby_names(&primary.connection_target).await {
            Ok(raw) => Some(ReplicationConfig::parse(&raw)),
            Err(e) => {
                tracing::warn!(
                    primary = %primary.name,
                    error = %e,
                    "Cannot read synchronous standby setting, keeping recorded sync states"
                );
                None
            }
        }
    }

    /// Returns true if any row changed.
    fn apply_sync_states(table: &mut RegistryTable, replication: Option<&ReplicationConfig>) -> bool {
        let Some(replication) = replication else {
            return false;
        };

        let mut changed = false;
        for node in table.nodes.iter_mut().filter(|n| !n.is_primary()) {
            let wanted = if replication.is_synchronous(&node.name) {
                SyncState::Sync
            } else {
                SyncState::Async
            };
            if node.sync_state != wanted {
                tracing::info!(node = %node.name, from = %node.sync_state, to = %wanted, "Sync state reconciled");
                node.sync_state = wanted;
                changed = true;
            }
        }
        changed
    }

    fn tag_self(&self, mut node: Node) -> Node {
        node.is_self = node.name == self.self_name;
        node
    }
}
