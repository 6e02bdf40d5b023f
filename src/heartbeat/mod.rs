//! Heartbeat probing.
//!
//! # Data Flow
//! ```text
//! coordinator loop (interval elapsed)
//!     → prober.rs (bounded probe, classify, log, count)
//!     → ProbeOutcome fed to the coordinator state machine
//! ```
//!
//! # Design Decisions
//! - No retries inside a probe; retry policy is the failure threshold
//! - Unreachable and QueryFailed count the same but log differently
//! - The timeout is enforced here as well as in the transport

pub mod prober;

pub use crate::node::ProbeOutcome;
pub use prober::HeartbeatProber;
