//! Transport boundary to database nodes.
//!
//! # Data Flow
//! ```text
//! heartbeat prober ──probe──────────────────┐
//! promotion controller ──promote/recovery───┼─▶ NodeClient ─▶ node agent (HTTP)
//! topology registry ──probe/sync names──────┘
//! ```
//!
//! # Design Decisions
//! - The keeper never speaks the database wire protocol itself; each
//!   database host runs a small agent and targets are opaque strings
//! - `probe` classifies instead of erroring: both failure kinds are
//!   ordinary heartbeat results
//! - Everything else returns `Result` so callers decide what is fatal

pub mod agent;
#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;

pub use agent::AgentClient;

/// Classified result of a single liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Connected and the liveness query succeeded.
    Alive,
    /// No connection could be established in time.
    Unreachable,
    /// Connected, but the liveness query did not succeed.
    QueryFailed,
}

impl ProbeOutcome {
    pub fn is_alive(self) -> bool {
        matches!(self, ProbeOutcome::Alive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProbeOutcome::Alive => "alive",
            ProbeOutcome::Unreachable => "unreachable",
            ProbeOutcome::QueryFailed => "query_failed",
        }
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `now + after`, saturating to a year out instead of overflowing.
pub fn deadline_after(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365))
}

/// Operations the keeper needs from a database node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// One bounded connect-then-query round trip. No retries.
    async fn probe(&self, target: &str, timeout: Duration) -> ProbeOutcome;

    /// Ask the server at `target` to leave recovery and become a primary.
    async fn promote(&self, target: &str) -> Result<()>;

    /// Whether the server at `target` is still replaying as a replica.
    async fn is_in_recovery(&self, target: &str) -> Result<bool>;

    /// Raw synchronous-standby setting of the primary at `target`.
    async fn synchronous_standby_names(&self, target: &str) -> Result<String>;
}
