//! Promotion controller.
//!
//! Sequence for one failure episode:
//! 1. promote the local server
//! 2. wait, bounded, until it reports it left recovery
//! 3. start the post-promotion command without waiting on it
//!
//! A timeout in step 2 is final for the episode. Re-issuing promote to a
//! half-promoted server is unsafe, so nothing here retries.

use std::sync::Arc;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::PromotionConfig;
use crate::error::{Error, Result};
use crate::node::{deadline_after, NodeClient};

pub struct PromotionController {
    client: Arc<dyn NodeClient>,
    local_target: String,
}

/// Result of a confirmed promotion.
#[derive(Debug)]
pub struct Promoted {
    /// Running post-promotion command, if one is configured.
    pub hook: Option<JoinHandle<bool>>,
}

impl PromotionController {
    pub fn new(client: Arc<dyn NodeClient>, local_target: impl Into<String>) -> Self {
        Self {
            client,
            local_target: local_target.into(),
        }
    }

    pub async fn execute(&self, settings: &PromotionConfig) -> Result<Promoted> {
        tracing::warn!(target = %self.local_target, "Promoting local server");

        self.client
            .promote(&self.local_target)
            .await
            .map_err(|e| Error::PromotionFailed(e.to_string()))?;

        self.wait_until_promoted(settings).await?;
        tracing::info!(target = %self.local_target, "Local server left recovery");

        let hook = settings.post_command.clone().map(|command| {
            tokio::spawn(async move { run_post_command(&command).await })
        });

        Ok(Promoted { hook })
    }

    async fn wait_until_promoted(&self, settings: &PromotionConfig) -> Result<()> {
        let timeout = settings.timeout();
        let deadline = deadline_after(timeout);

        loop {
            match time::timeout_at(deadline, self.client.is_in_recovery(&self.local_target)).await {
                Ok(Ok(false)) => return Ok(()),
                Ok(Ok(true)) => {}
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "Recovery status unavailable while promoting");
                }
                Err(_) => return Err(Error::PromotionTimeout(timeout)),
            }

            let next = deadline_after(settings.poll_interval());
            if next >= deadline {
                time::sleep_until(deadline).await;
                return Err(Error::PromotionTimeout(timeout));
            }
            time::sleep_until(next).await;
        }
    }
}

/// Run the post-promotion shell command. Failures are logged only.
pub async fn run_post_command(command: &str) -> bool {
    tracing::info!(command = %command, "Running post-promotion command");
    match Command::new("sh").arg("-c").arg(command).status().await {
        Ok(status) if status.success() => true,
        Ok(status) => {
            tracing::warn!(command = %command, status = %status, "Post-promotion command failed");
            false
        }
        Err(e) => {
            tracing::warn!(command = %command, error = %e, "Post-promotion command could not start");
            false
        }
    }
}
