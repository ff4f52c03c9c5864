//! Business metrics for the eligibility orchestrator.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `academics_transactions_total{kind,outcome}` - Finished transactions by
//!   kind and outcome (succeeded, denied, failed)
//! - `academics_gate_denials_total{gate}` - Denials by gate
//! - `academics_remote_queries_total{service,outcome}` - Remote lookups by
//!   service and outcome (ok, unreachable, rejected, malformed)
//!
//! ## Histograms
//! - `academics_transaction_duration_seconds{kind}` - Time from command to outcome

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Finished transactions
pub const TRANSACTIONS_TOTAL: &str = "academics_transactions_total";
/// Denials per gate
pub const GATE_DENIALS_TOTAL: &str = "academics_gate_denials_total";
/// Remote lookups
pub const REMOTE_QUERIES_TOTAL: &str = "academics_remote_queries_total";
/// Transaction latency
pub const TRANSACTION_DURATION_SECONDS: &str = "academics_transaction_duration_seconds";

/// Register all business metric descriptions.
///
/// Call once at startup, before any metric is recorded.
pub fn register_business_metrics() {
    describe_counter!(
        TRANSACTIONS_TOTAL,
        "Finished transactions by kind and outcome (succeeded, denied, failed)"
    );
    describe_counter!(GATE_DENIALS_TOTAL, "Transactions denied, by gate");
    describe_counter!(
        REMOTE_QUERIES_TOTAL,
        "Remote lookups by service and outcome (ok, unreachable, rejected, malformed)"
    );
    describe_histogram!(
        TRANSACTION_DURATION_SECONDS,
        "Time from command to outcome"
    );

    tracing::info!("Business metrics registered");
}

/// Install the Prometheus recorder with its own HTTP listener.
///
/// # Errors
///
/// Returns error if a recorder is already installed or the listener cannot bind.
pub fn install_exporter(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(%addr, "Prometheus metrics available at /metrics");
    Ok(())
}
