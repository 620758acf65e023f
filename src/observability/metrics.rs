//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_submissions_total` (counter): POST bodies by relay outcome
//! - `relay_entries_persisted_total` (counter): entries written to the document
//! - `relay_parse_failures_total` (counter): payloads rejected by the parser
//! - `relay_store_failures_total` (counter): appends that failed on I/O or JSON
//! - `relay_document_entries` (gauge): entries in the document after the last write

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a POST submission and whether the relay accepted it.
pub fn record_submission(relayed: bool) {
    let outcome = if relayed { "relayed" } else { "relay_failed" };
    metrics::counter!("relay_submissions_total", "outcome" => outcome).increment(1);
}

/// Record a persisted entry and the resulting document size.
pub fn record_persisted(total_entries: usize) {
    metrics::counter!("relay_entries_persisted_total").increment(1);
    metrics::gauge!("relay_document_entries").set(total_entries as f64);
}

pub fn record_parse_failure() {
    metrics::counter!("relay_parse_failures_total").increment(1);
}

pub fn record_store_failure() {
    metrics::counter!("relay_store_failures_total").increment(1);
}
