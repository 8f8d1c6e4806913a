//! Metric sample types produced by the collector.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Observed health state of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl TargetStatus {
    pub fn is_healthy(self) -> bool {
        self == TargetStatus::Healthy
    }
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TargetStatus::Healthy => "healthy",
            TargetStatus::Degraded => "degraded",
            TargetStatus::Unhealthy => "unhealthy",
            TargetStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One health measurement of one target, read-only once published.
///
/// `response_time_ms` is `f64::INFINITY` when the target never answered.
/// `error_rate_pct` and `uptime_pct` are rolling statistics over the
/// target's bounded history, not instantaneous values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub target: String,
    pub status: TargetStatus,
    pub response_time_ms: f64,
    pub error_rate_pct: f64,
    pub consecutive_failures: u32,
    pub uptime_pct: f64,
    /// Unix timestamp in milliseconds.
    pub last_check_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Result of the lightweight liveness check (`health_check_all`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheckResult {
    pub status: TargetStatus,
    pub response_time_ms: f64,
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Current wall-clock time as unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
