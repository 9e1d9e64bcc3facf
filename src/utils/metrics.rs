//! Prometheus metrics

use crate::{ArbitrageError, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Metric names
pub mod names {
    /// Routes submitted
    pub const EXECUTIONS_TOTAL: &str = "executor_executions_total";
    /// Routes settled
    pub const SETTLEMENTS_TOTAL: &str = "executor_settlements_total";
    /// Routes reverted, labelled by reason code
    pub const REVERTS_TOTAL: &str = "executor_reverts_total";
    /// Realised profit in stable base units
    pub const REALIZED_PROFIT: &str = "executor_realized_profit";
    /// Gas cost in stable base units
    pub const GAS_COST: &str = "executor_gas_cost";
    /// Committed custody balance
    pub const CUSTODY_BALANCE: &str = "executor_custody_balance";
    /// Threshold in force
    pub const MIN_PROFIT_BPS: &str = "executor_min_profit_bps";
    /// End-to-end attempt latency
    pub const EXECUTION_LATENCY: &str = "executor_execution_latency_seconds";
    /// Administrative calls, labelled by operation and outcome
    pub const ADMIN_OPERATIONS_TOTAL: &str = "executor_admin_operations_total";
}

/// Install the Prometheus recorder and its HTTP listener
pub fn install_exporter(listen_addr: &str) -> Result<()> {
    let addr: SocketAddr = listen_addr
        .parse()
        .map_err(|e| ArbitrageError::Monitoring(format!("Invalid metrics address {}: {}", listen_addr, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ArbitrageError::Monitoring(format!("Failed to install metrics exporter: {}", e)))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record a submitted route
pub fn record_attempt() {
    metrics::increment_counter!(names::EXECUTIONS_TOTAL);
}

/// Record a settled route
pub fn record_settlement(realized_profit: u128, gas_cost: u128, latency: Duration) {
    metrics::increment_counter!(names::SETTLEMENTS_TOTAL);
    metrics::counter!(names::REALIZED_PROFIT, saturate(realized_profit));
    metrics::counter!(names::GAS_COST, saturate(gas_cost));
    metrics::histogram!(names::EXECUTION_LATENCY, latency.as_secs_f64(), "outcome" => "settled");
}

/// Record a reverted route
pub fn record_revert(code: &'static str, latency: Duration) {
    metrics::increment_counter!(names::REVERTS_TOTAL, "reason" => code);
    metrics::histogram!(names::EXECUTION_LATENCY, latency.as_secs_f64(), "outcome" => "reverted");
}

/// Publish committed engine state
pub fn record_state(custody_balance: u128, min_profit_bps: u32) {
    metrics::gauge!(names::CUSTODY_BALANCE, custody_balance as f64);
    metrics::gauge!(names::MIN_PROFIT_BPS, min_profit_bps as f64);
}

/// Record an administrative call
pub fn record_admin(operation: &'static str, outcome: &'static str) {
    metrics::increment_counter!(names::ADMIN_OPERATIONS_TOTAL, "operation" => operation, "outcome" => outcome);
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
