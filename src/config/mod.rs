//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! keeper.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → KeeperConfig (validated, immutable)
//!     → shared via ArcSwap with the admin API
//!
//! On reload signal (SIGHUP or file change):
//!     watcher.rs / signals raise the reload-config flag
//!     → coordinator loop calls loader.rs
//!     → reloadable tunables applied, identity kept
//! ```
//!
//! # Design Decisions
//! - All sections have defaults so a minimal file only names the node
//! - Identity and connection targets are fixed for the life of the process
//! - Validation reports every problem, not just the first

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::{
    AdminConfig, HeartbeatConfig, KeeperConfig, LifecycleConfig, NodeConfig, ObservabilityConfig,
    PromotionConfig, RegistryConfig,
};
