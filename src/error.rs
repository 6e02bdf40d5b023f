//! Error types for the failover keeper.

use std::time::Duration;
use thiserror::Error;

use crate::config::loader::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Configuration ===
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("startup failed: {0}")]
    Startup(String),

    // === Administrative input ===
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node already registered: {0}")]
    DuplicateNode(String),

    #[error("cannot remove primary node {0} while standbys are registered")]
    PrimaryRemoval(String),

    #[error("node at {target} is not reachable ({outcome})")]
    NodeUnreachable { target: String, outcome: String },

    #[error("unknown notification signal: {0}")]
    UnknownSignal(String),

    // === Transport ===
    #[error("transport error talking to {target}: {reason}")]
    Transport { target: String, reason: String },

    #[error("invalid connection target: {0}")]
    InvalidTarget(String),

    // === Promotion ===
    #[error("promote command failed: {0}")]
    PromotionFailed(String),

    #[error("server did not leave recovery within {0:?}")]
    PromotionTimeout(Duration),

    // === Registry ===
    #[error("registry corrupted: {0}")]
    Registry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn transport(target: &str, reason: impl std::fmt::Display) -> Self {
        Error::Transport {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Errors caused by the caller's input rather than the keeper itself.
    pub fn is_admin_input(&self) -> bool {
        matches!(
            self,
            Error::NodeNotFound(_)
                | Error::DuplicateNode(_)
                | Error::PrimaryRemoval(_)
                | Error::NodeUnreachable { .. }
                | Error::UnknownSignal(_)
                | Error::InvalidTarget(_)
        )
    }

    /// Convert to HTTP status code for the admin API.
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::NodeNotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateNode(_) | Error::PrimaryRemoval(_) => StatusCode::CONFLICT,
            Error::UnknownSignal(_) | Error::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            Error::NodeUnreachable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Transport { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
