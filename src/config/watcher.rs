//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use notify::{Watcher, RecursiveMode, Event, RecommendedWatcher, Config};
use crate::coordinator::relay::{RelayFlag, SignalRelay};

/// A watcher that raises the reload-config flag when the file changes.
///
/// Parsing happens in the coordinator loop, so a burst of write events
/// collapses into a single reload.
pub struct ConfigWatcher {
    path: PathBuf,
    relay: Arc<SignalRelay>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, relay: Arc<SignalRelay>) -> Self {
        Self {
            path: path.to_path_buf(),
            relay,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let relay = self.relay.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, scheduling reload");
                        relay.raise(RelayFlag::ReloadConfig);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
