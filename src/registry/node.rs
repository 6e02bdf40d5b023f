//! Registry row types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Standby,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Sync,
    Async,
    Unconfigured,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => f.write_str("primary"),
            Role::Standby => f.write_str("standby"),
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Sync => f.write_str("sync"),
            SyncState::Async => f.write_str("async"),
            SyncState::Unconfigured => f.write_str("unconfigured"),
        }
    }
}

/// One cluster member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub sequence_number: u64,
    pub name: String,
    pub connection_target: String,
    pub role: Role,
    pub sync_state: SyncState,
    /// Row for the server this keeper runs beside. Derived on read.
    #[serde(default)]
    pub is_self: bool,
}

impl Node {
    pub fn is_primary(&self) -> bool {
        self.role == Role::Primary
    }

    pub fn is_sync_standby(&self) -> bool {
        self.role == Role::Standby && self.sync_state == SyncState::Sync
    }

    /// Same member at the same address.
    pub fn same_target(&self, other: &Node) -> bool {
        self.name == other.name && self.connection_target == other.connection_target
    }
}
