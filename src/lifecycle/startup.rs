//! Process registration record.
//!
//! Written once at startup so administrative tools can find this
//! coordinator (its pid for SIGUSR1, its admin address for HTTP calls).
//! Read-only afterwards; removed when the guard drops.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

pub const RECORD_FILE: &str = "keeperd.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub pid: u32,
    pub node_name: String,
    pub admin_address: Option<String>,
    pub started_at: u64,
}

impl RegistrationRecord {
    pub fn for_current_process(node_name: &str, admin_address: Option<String>) -> Self {
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            pid: std::process::id(),
            node_name: node_name.to_string(),
            admin_address,
            started_at,
        }
    }

    /// Read the record published in `state_dir`.
    pub fn read(state_dir: &Path) -> Result<Self> {
        let bytes = fs::read(state_dir.join(RECORD_FILE))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Owns the published record file.
#[derive(Debug)]
pub struct Registration {
    path: PathBuf,
}

impl Registration {
    pub fn publish(state_dir: &Path, record: &RegistrationRecord) -> Result<Self> {
        fs::create_dir_all(state_dir)?;
        let path = state_dir.join(RECORD_FILE);
        fs::write(&path, serde_json::to_vec_pretty(record)?)?;
        tracing::info!(path = %path.display(), pid = record.pid, "Registration record published");
        Ok(Self { path })
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Could not remove registration record");
        }
    }
}
