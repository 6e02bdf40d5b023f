//! OS signal handling.
//!
//! Signals only raise relay flags; the coordinator loop acts on them at
//! its next iteration.

use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

use crate::coordinator::relay::{RelayFlag, SignalRelay};

/// Install handlers for SIGTERM, SIGINT, SIGHUP and SIGUSR1.
pub fn install(relay: Arc<SignalRelay>) -> std::io::Result<JoinHandle<()>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut user1 = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        loop {
            let flag = tokio::select! {
                _ = terminate.recv() => RelayFlag::Terminate,
                _ = interrupt.recv() => RelayFlag::Terminate,
                _ = hangup.recv() => RelayFlag::ReloadConfig,
                _ = user1.recv() => RelayFlag::ReloadRegistry,
            };
            tracing::info!(flag = ?flag, "Signal received");
            relay.raise(flag);
            if flag == RelayFlag::Terminate {
                break;
            }
        }
    }))
}
