//! Signal relay between external triggers and the coordinator loop.
//!
//! Admin handlers, OS signal listeners and the config watcher raise flags;
//! the loop drains them once per iteration in priority order and otherwise
//! sleeps on a single wake primitive.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::Error;

/// Pending work for the coordinator loop, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayFlag {
    Terminate,
    ReloadConfig,
    ReloadRegistry,
}

impl RelayFlag {
    /// Drain order. Termination is never starved by registry churn.
    pub const PRIORITY: [RelayFlag; 3] = [
        RelayFlag::Terminate,
        RelayFlag::ReloadConfig,
        RelayFlag::ReloadRegistry,
    ];
}

#[derive(Debug, Default)]
pub struct SignalRelay {
    terminate: AtomicBool,
    reload_config: AtomicBool,
    reload_registry: AtomicBool,
    wake: Notify,
}

impl SignalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, flag: RelayFlag) -> &AtomicBool {
        match flag {
            RelayFlag::Terminate => &self.terminate,
            RelayFlag::ReloadConfig => &self.reload_config,
            RelayFlag::ReloadRegistry => &self.reload_registry,
        }
    }

    /// Set a flag and wake the loop.
    pub fn raise(&self, flag: RelayFlag) {
        self.slot(flag).store(true, Ordering::SeqCst);
        // notify_one keeps a permit when nobody is waiting, so a raise that
        // races with the loop going to sleep is not lost.
        self.wake.notify_one();
    }

    /// Clear a flag, returning whether it was set.
    pub fn take(&self, flag: RelayFlag) -> bool {
        self.slot(flag).swap(false, Ordering::SeqCst)
    }

    /// Take the highest-priority pending flag.
    pub fn next_pending(&self) -> Option<RelayFlag> {
        RelayFlag::PRIORITY.into_iter().find(|flag| self.take(*flag))
    }

    /// Sleep until `deadline` or until any flag is raised.
    pub async fn wait_until(&self, deadline: Instant) {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {}
            _ = self.wake.notified() => {}
        }
    }
}

/// Names accepted by the `notify_coordinator` administrative call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifySignal {
    ReloadRegistry,
}

impl NotifySignal {
    pub const RELOAD_REGISTRY: &'static str = "reload_registry";

    pub fn flag(self) -> RelayFlag {
        match self {
            NotifySignal::ReloadRegistry => RelayFlag::ReloadRegistry,
        }
    }
}

impl FromStr for NotifySignal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::RELOAD_REGISTRY => Ok(NotifySignal::ReloadRegistry),
            other => Err(Error::UnknownSignal(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn drains_in_priority_order() {
        let relay = SignalRelay::new();
        relay.raise(RelayFlag::ReloadRegistry);
        relay.raise(RelayFlag::Terminate);
        relay.raise(RelayFlag::ReloadConfig);

        assert_eq!(relay.next_pending(), Some(RelayFlag::Terminate));
        assert_eq!(relay.next_pending(), Some(RelayFlag::ReloadConfig));
        assert_eq!(relay.next_pending(), Some(RelayFlag::ReloadRegistry));
        assert_eq!(relay.next_pending(), None);
    }

    #[test]
    fn repeated_raises_coalesce() {
        let relay = SignalRelay::new();
        relay.raise(RelayFlag::ReloadRegistry);
        relay.raise(RelayFlag::ReloadRegistry);
        assert!(relay.take(RelayFlag::ReloadRegistry));
        assert!(!relay.take(RelayFlag::ReloadRegistry));
    }

    #[test]
    fn unknown_signal_names_are_errors() {
        assert_eq!(
            "reload_registry".parse::<NotifySignal>().unwrap(),
            NotifySignal::ReloadRegistry
        );
        assert!(matches!(
            "bogus-signal".parse::<NotifySignal>(),
            Err(Error::UnknownSignal(name)) if name == "bogus-signal"
        ));
    }

    #[tokio::test]
    async fn raise_wakes_a_waiting_loop() {
        let relay = Arc::new(SignalRelay::new());
        let waiter = relay.clone();
        let far = Instant::now() + Duration::from_secs(3600);

        let handle = tokio::spawn(async move {
            waiter.wait_until(far).await;
            waiter.take(RelayFlag::ReloadRegistry)
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        relay.raise(RelayFlag::ReloadRegistry);

        let woke = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop was not woken")
            .unwrap();
        assert!(woke);
    }

    #[tokio::test]
    async fn raise_before_wait_is_not_lost() {
        let relay = SignalRelay::new();
        relay.raise(RelayFlag::Terminate);
        let far = Instant::now() + Duration::from_secs(3600);
        tokio::time::timeout(Duration::from_secs(1), relay.wait_until(far))
            .await
            .expect("stored wake permit was lost");
    }
}
