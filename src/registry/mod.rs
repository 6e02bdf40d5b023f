//! Topology registry subsystem.
//!
//! # Data Flow
//! ```text
//! admin add/remove
//!     → topology.rs (probe, insert/delete, reconcile)
//!     → store.rs (atomic JSON write)
//!     → SignalRelay (reload-registry)
//!     → coordinator reloads list()
//!
//! reconcile:
//!     primary's synchronous standby setting
//!     → replication.rs (parse member names)
//!     → each standby row's sync_state
//! ```
//!
//! # Design Decisions
//! - The file is the source of truth; every operation re-reads it under the lock
//! - Sequence numbers are strictly increasing and never reused
//! - Exactly one primary row whenever the table is non-empty

pub mod node;
pub mod replication;
pub mod store;
pub mod topology;

pub use node::{Node, Role, SyncState};
pub use replication::ReplicationConfig;
pub use store::{FileStore, RegistryTable};
pub use topology::TopologyRegistry;
