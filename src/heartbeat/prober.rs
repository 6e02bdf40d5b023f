//! Bounded liveness probe against one target.

use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::node::{NodeClient, ProbeOutcome};
use crate::observability::metrics;

#[derive(Clone)]
pub struct HeartbeatProber {
    client: Arc<dyn NodeClient>,
}

impl HeartbeatProber {
    pub fn new(client: Arc<dyn NodeClient>) -> Self {
        Self { client }
    }

    /// Probe `target`, never taking longer than `timeout`.
    pub async fn probe(&self, target: &str, timeout: Duration) -> ProbeOutcome {
        let outcome = match time::timeout(timeout, self.client.probe(target, timeout)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Unreachable,
        };

        match outcome {
            ProbeOutcome::Alive => {
                tracing::debug!(target = %target, "Heartbeat ok");
            }
            ProbeOutcome::Unreachable => {
                tracing::warn!(target = %target, timeout = ?timeout, "Heartbeat failed: could not connect");
            }
            ProbeOutcome::QueryFailed => {
                tracing::warn!(target = %target, "Heartbeat failed: liveness query did not succeed");
            }
        }

        metrics::record_probe(outcome);
        outcome
    }
}
