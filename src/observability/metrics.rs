//! Metrics collection and exposition.
//!
//! # Metrics
//! - `keeper_probes_total` (counter): heartbeat probes by outcome
//! - `keeper_consecutive_failures` (gauge): current failure count
//! - `keeper_promotions_total` (counter): promotion attempts by result
//! - `keeper_registry_nodes` (gauge): rows in the topology registry
//! - `keeper_role` (gauge): 1=master, 0=standby
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::node::ProbeOutcome;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(outcome: ProbeOutcome) {
    metrics::counter!("keeper_probes_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn set_consecutive_failures(failures: u32) {
    metrics::gauge!("keeper_consecutive_failures").set(failures as f64);
}

pub fn record_promotion(succeeded: bool) {
    let result = if succeeded { "success" } else { "failure" };
    metrics::counter!("keeper_promotions_total", "result" => result).increment(1);
}

pub fn set_registry_nodes(count: usize) {
    metrics::gauge!("keeper_registry_nodes").set(count as f64);
}

pub fn set_role(is_master: bool) {
    metrics::gauge!("keeper_role").set(if is_master { 1.0 } else { 0.0 });
}
