//! Failover keeper library.
//!
//! Watches the primary of a primary/replica database cluster, promotes
//! the local replica when the primary stops answering, and keeps a
//! persistent topology registry of cluster members.

pub mod admin;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod heartbeat;
pub mod lifecycle;
pub mod node;
pub mod observability;
pub mod registry;

pub use config::schema::KeeperConfig;
pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use lifecycle::Shutdown;
