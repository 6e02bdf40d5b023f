//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for a keeper process.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct KeeperConfig {
    /// Identity and connection targets.
    pub node: NodeConfig,

    /// Heartbeat timing and failure threshold.
    pub heartbeat: HeartbeatConfig,

    /// Promotion sequencing.
    pub promotion: PromotionConfig,

    /// Topology registry location.
    pub registry: RegistryConfig,

    /// Administrative API settings.
    pub admin: AdminConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Process registration record.
    pub lifecycle: LifecycleConfig,
}

/// Identity of this keeper. Not hot-reloadable.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    /// Name of this node in the registry. Mandatory.
    pub name: String,

    /// Agent address of the local database server.
    pub local_target: String,

    /// Primary to watch when running as a standby and the registry has no primary.
    pub primary_target: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Seconds between probes.
    pub interval_secs: u64,

    /// Consecutive failed probes before promotion.
    pub failure_threshold: u32,

    /// Upper bound for a single probe, in seconds.
    pub timeout_secs: u64,
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            failure_threshold: 1,
            timeout_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PromotionConfig {
    /// Seconds to wait for the server to leave recovery after promote.
    pub timeout_secs: u64,

    /// How often recovery status is polled while waiting, in milliseconds.
    pub poll_interval_ms: u64,

    /// Shell command run after a confirmed promotion (best effort).
    pub post_command: Option<String>,
}

impl PromotionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            poll_interval_ms: 500,
            post_command: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path of the persisted registry table.
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("keeper-registry.json"),
        }
    }
}

/// Administrative API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin API.
    pub enabled: bool,

    /// Admin API bind address.
    pub bind_address: String,

    /// API key for authentication (Bearer token). Empty disables auth.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8432".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9187".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Directory holding the registration record.
    pub state_dir: PathBuf,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("."),
        }
    }
}

impl KeeperConfig {
    /// Apply the hot-reloadable sections of `incoming` on top of `self`.
    ///
    /// Returns the merged config and the names of changed sections that
    /// only take effect after a restart.
    pub fn with_reloaded(&self, incoming: KeeperConfig) -> (KeeperConfig, Vec<&'static str>) {
        let mut ignored = Vec::new();
        if incoming.node != self.node {
            ignored.push("node");
        }
        if incoming.registry != self.registry {
            ignored.push("registry");
        }
        if incoming.admin != self.admin {
            ignored.push("admin");
        }
        if incoming.observability != self.observability {
            ignored.push("observability");
        }
        if incoming.lifecycle != self.lifecycle {
            ignored.push("lifecycle");
        }

        let mut next = self.clone();
        next.heartbeat = incoming.heartbeat;
        next.promotion = incoming.promotion;
        (next, ignored)
    }
}
