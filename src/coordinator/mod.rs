//! Failover coordination engine.
//!
//! # Data Flow
//! ```text
//! admin API / OS signals / config watcher
//!     → relay.rs (flags + wake)
//!     → keeper.rs main loop
//!         → heartbeat prober → status.rs transitions
//!         → promotion.rs when the standby is alone
//!         → StatusSnapshot published for the admin API
//! ```
//!
//! # Design Decisions
//! - Single cooperative loop, no internal threads
//! - Flags drained as terminate > reload-config > reload-registry > heartbeat
//! - Promotion switches the role in place; the process keeps running

pub mod keeper;
pub mod promotion;
pub mod relay;
pub mod status;

pub use keeper::{detect_role, Coordinator, StatusSnapshot};
pub use relay::{NotifySignal, RelayFlag, SignalRelay};
pub use status::{CoordinatorStatus, KeeperRole, MasterState, StandbyState, Status};
