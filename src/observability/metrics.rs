//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define registry metrics (groups, leaves, aggregation sessions)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `registry_groups_active` (gauge): groups currently registered
//! - `registry_leaves_created_total` (counter): leaves created
//! - `registry_leaves_terminated_total` (counter): leaves terminated
//! - `registry_sessions_total` (counter): aggregation sessions completed
//! - `registry_session_readings_total` (counter): readings by status
//! - `registry_session_duration_seconds` (histogram): time to the single reply
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels limited to reading status to keep cardinality fixed

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::registry::protocol::{LeafId, Reading};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_groups_active(count: usize) {
    gauge!("registry_groups_active").set(count as f64);
}

pub fn record_leaf_started() {
    counter!("registry_leaves_created_total").increment(1);
}

pub fn record_leaf_stopped() {
    counter!("registry_leaves_terminated_total").increment(1);
}

pub fn record_session(readings: &BTreeMap<LeafId, Reading>, elapsed: Duration) {
    counter!("registry_sessions_total").increment(1);
    for reading in readings.values() {
        counter!("registry_session_readings_total", "status" => reading.status()).increment(1);
    }
    histogram!("registry_session_duration_seconds").record(elapsed.as_secs_f64());
}
