//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: KeeperConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted, both at startup and on reload

use std::net::SocketAddr;
use crate::config::schema::KeeperConfig;

/// Longest accepted interval or timeout, in seconds.
pub const MAX_DURATION_SECS: u64 = 86_400;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &KeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.node.name.trim().is_empty() {
        errors.push(ValidationError::new("node.name", "is mandatory"));
    }
    if config.node.local_target.trim().is_empty() {
        errors.push(ValidationError::new("node.local_target", "is mandatory"));
    }
    if let Some(primary) = &config.node.primary_target {
        if primary.trim().is_empty() {
            errors.push(ValidationError::new("node.primary_target", "must not be empty when set"));
        }
    }

    check_seconds(&mut errors, "heartbeat.interval_secs", config.heartbeat.interval_secs);
    if config.heartbeat.failure_threshold < 1 {
        errors.push(ValidationError::new("heartbeat.failure_threshold", "must be >= 1"));
    }
    check_seconds(&mut errors, "heartbeat.timeout_secs", config.heartbeat.timeout_secs);

    check_seconds(&mut errors, "promotion.timeout_secs", config.promotion.timeout_secs);
    if config.promotion.poll_interval_ms == 0 {
        errors.push(ValidationError::new("promotion.poll_interval_ms", "must be > 0"));
    } else if config.promotion.poll_interval_ms > MAX_DURATION_SECS * 1000 {
        errors.push(ValidationError::new(
            "promotion.poll_interval_ms",
            format!("must be <= {}", MAX_DURATION_SECS * 1000),
        ));
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "admin.bind_address",
            format!("invalid socket address {:?}", config.admin.bind_address),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_seconds(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value < 1 {
        errors.push(ValidationError::new(field, "must be >= 1"));
    } else if value > MAX_DURATION_SECS {
        errors.push(ValidationError::new(field, format!("must be <= {}", MAX_DURATION_SECS)));
    }
}
