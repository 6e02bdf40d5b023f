//! Scripted in-memory node client for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::node::{NodeClient, ProbeOutcome};

#[derive(Default)]
pub(crate) struct FakeNodeClient {
    /// Queued probe results per target, consumed front to back.
    scripted: Mutex<HashMap<String, VecDeque<ProbeOutcome>>>,
    /// Result once a target's queue is empty. Unknown targets are unreachable.
    fallback: Mutex<HashMap<String, ProbeOutcome>>,
    /// Targets whose probes never answer.
    hanging: Mutex<HashSet<String>>,
    sync_names: Mutex<HashMap<String, String>>,
    /// Recovery answers for the local server, the last one repeats.
    recovery: Mutex<VecDeque<bool>>,
    promote_fails: Mutex<bool>,
    pub promote_calls: AtomicUsize,
    pub probe_calls: AtomicUsize,
}

impl FakeNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_alive(&self, target: &str, outcome: ProbeOutcome) {
        self.fallback.lock().unwrap().insert(target.to_string(), outcome);
    }

    pub fn hang(&self, target: &str) {
        self.hanging.lock().unwrap().insert(target.to_string());
    }

    pub fn script(&self, target: &str, outcomes: &[ProbeOutcome]) {
        self.scripted
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .extend(outcomes.iter().copied());
    }

    pub fn set_sync_names(&self, target: &str, raw: &str) {
        self.sync_names.lock().unwrap().insert(target.to_string(), raw.to_string());
    }

    pub fn set_recovery(&self, answers: &[bool]) {
        *self.recovery.lock().unwrap() = answers.iter().copied().collect();
    }

    pub fn fail_promote(&self) {
        *self.promote_fails.lock().unwrap() = true;
    }

    pub fn promotions(&self) -> usize {
        self.promote_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeClient for FakeNodeClient {
    async fn probe(&self, target: &str, _timeout: Duration) -> ProbeOutcome {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let hangs = self.hanging.lock().unwrap().contains(target);
        if hangs {
            std::future::pending::<()>().await;
        }
        if let Some(next) = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(target)
            .and_then(|queue| queue.pop_front())
        {
            return next;
        }
        self.fallback
            .lock()
            .unwrap()
            .get(target)
            .copied()
            .unwrap_or(ProbeOutcome::Unreachable)
    }

    async fn promote(&self, target: &str) -> Result<()> {
        self.promote_calls.fetch_add(1, Ordering::SeqCst);
        if *self.promote_fails.lock().unwrap() {
            return Err(Error::transport(target, "promote rejected"));
        }
        Ok(())
    }

    async fn is_in_recovery(&self, _target: &str) -> Result<bool> {
        let mut answers = self.recovery.lock().unwrap();
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().copied()
        };
        Ok(answer.unwrap_or(false))
    }

    async fn synchronous_standby_names(&self, target: &str) -> Result<String> {
        self.sync_names
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .ok_or_else(|| Error::transport(target, "unreachable"))
    }
}
