//! Coordinator status state machine.
//!
//! # States
//! ```text
//! Standby:  Ready ──alive──▶ Connected
//!           Ready/Connected ──failures >= threshold──▶ Alone (promote)
//!           Alone ──promotion confirmed──▶ Master(Ready)
//!
//! Master:   Ready/Connected/Async ──sync standby reachable──▶ Connected
//!           Ready/Connected/Async ──none reachable──▶ Async
//! ```
//!
//! Role and substate are one tagged value, so every combination the loop
//! can observe is spelled out here and checked by the compiler.

use serde::Serialize;

use crate::node::ProbeOutcome;
use crate::registry::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeeperRole {
    Master,
    Standby,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StandbyState {
    Ready,
    Connected,
    /// Primary lost; promotion attempted. Left only by a confirmed promotion.
    Alone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MasterState {
    Ready,
    Connected,
    /// No synchronous standby reachable. Degraded durability, not fatal.
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Standby(StandbyState),
    Master(MasterState),
}

impl Status {
    pub fn role(self) -> KeeperRole {
        match self {
            Status::Standby(_) => KeeperRole::Standby,
            Status::Master(_) => KeeperRole::Master,
        }
    }

    pub fn substate(self) -> &'static str {
        match self {
            Status::Standby(StandbyState::Ready) | Status::Master(MasterState::Ready) => "ready",
            Status::Standby(StandbyState::Connected) | Status::Master(MasterState::Connected) => "connected",
            Status::Standby(StandbyState::Alone) => "alone",
            Status::Master(MasterState::Async) => "async",
        }
    }
}

/// What the loop must do after a standby heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandbyStep {
    Unchanged,
    Connected,
    Promote,
}

#[derive(Debug, Clone)]
pub struct CoordinatorStatus {
    pub status: Status,
    pub consecutive_failures: u32,
    pub target: Option<Node>,
}

impl CoordinatorStatus {
    pub fn new(role: KeeperRole) -> Self {
        let status = match role {
            KeeperRole::Standby => Status::Standby(StandbyState::Ready),
            KeeperRole::Master => Status::Master(MasterState::Ready),
        };
        Self {
            status,
            consecutive_failures: 0,
            target: None,
        }
    }

    pub fn role(&self) -> KeeperRole {
        self.status.role()
    }

    /// Switch the monitored node. The failure counter is per target.
    ///
    /// Returns true if the target changed.
    pub fn set_target(&mut self, target: Option<Node>) -> bool {
        let unchanged = match (&self.target, &target) {
            (Some(current), Some(next)) => current.same_target(next),
            (None, None) => true,
            _ => false,
        };
        self.target = target;
        if !unchanged {
            self.consecutive_failures = 0;
        }
        !unchanged
    }

    /// Feed one probe result of the watched primary.
    pub fn record_standby_probe(&mut self, outcome: ProbeOutcome, threshold: u32) -> StandbyStep {
        let state = match self.status {
            Status::Standby(StandbyState::Alone) | Status::Master(_) => return StandbyStep::Unchanged,
            Status::Standby(state) => state,
        };

        if outcome.is_alive() {
            self.consecutive_failures = 0;
            if state == StandbyState::Ready {
                self.status = Status::Standby(StandbyState::Connected);
                return StandbyStep::Connected;
            }
            return StandbyStep::Unchanged;
        }

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        // >= rather than == so a threshold lowered by reload still fires.
        if self.consecutive_failures >= threshold.max(1) {
            self.status = Status::Standby(StandbyState::Alone);
            return StandbyStep::Promote;
        }
        StandbyStep::Unchanged
    }

    /// Feed the master's view of its synchronous standbys.
    ///
    /// Returns the new substate if it changed.
    pub fn record_master_health(&mut self, sync_standby_alive: bool) -> Option<MasterState> {
        let Status::Master(current) = self.status else {
            return None;
        };
        let next = if sync_standby_alive {
            MasterState::Connected
        } else {
            MasterState::Async
        };
        if next == current {
            return None;
        }
        self.status = Status::Master(next);
        Some(next)
    }

    /// The local server left recovery: continue as master in this process.
    pub fn promotion_confirmed(&mut self) {
        self.status = Status::Master(MasterState::Ready);
        self.consecutive_failures = 0;
        self.target = None;
    }
}
