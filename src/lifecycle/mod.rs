//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → detect role → publish registration record
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → terminate flag
//!     SIGHUP → reload-config flag
//!     SIGUSR1 → reload-registry flag
//!
//! Shutdown (shutdown.rs):
//!     Coordinator loop exits → broadcast → admin server drains and stops
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The registration record is written once and removed on exit
//! - No automatic restart; an unexpected exit needs an operator

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Registration, RegistrationRecord};
