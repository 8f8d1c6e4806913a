//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fleetwatch_probe_total` (counter): probes by target and outcome
//! - `fleetwatch_probe_duration_ms` (gauge): last observed latency per target
//! - `fleetwatch_target_healthy` (gauge): 1=healthy, 0=not
//! - `fleetwatch_cache_reads_total` (counter): cache reads by target and result
//! - `fleetwatch_breaker_state` (gauge): 0=closed, 1=half-open, 2=open

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::collector::sample::MetricSample;
use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus exporter on `addr`. Requires a running Tokio
/// runtime; recording works (as a no-op) even if this is never called.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record one collected sample.
pub fn record_sample(sample: &MetricSample) {
    let outcome = if sample.error_message.is_none() {
        "ok"
    } else {
        "error"
    };
    metrics::counter!(
        "fleetwatch_probe_total",
        "target" => sample.target.clone(),
        "outcome" => outcome,
    )
    .increment(1);

    if sample.response_time_ms.is_finite() {
        metrics::gauge!("fleetwatch_probe_duration_ms", "target" => sample.target.clone())
            .set(sample.response_time_ms);
    }

    let healthy = if sample.status.is_healthy() { 1.0 } else { 0.0 };
    metrics::gauge!("fleetwatch_target_healthy", "target" => sample.target.clone()).set(healthy);
}

/// Record a cache lookup result for a target.
pub fn record_cache_read(target: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!(
        "fleetwatch_cache_reads_total",
        "target" => target.to_string(),
        "result" => result,
    )
    .increment(1);
}

/// Record a breaker's current state.
pub fn record_breaker_state(name: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("fleetwatch_breaker_state", "breaker" => name.to_string()).set(value);
}
