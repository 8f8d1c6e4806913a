//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the fleet monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Monitored target definitions.
    pub targets: Vec<TargetConfig>,

    /// Collector settings (cache TTL, history depth).
    pub collector: CollectorConfig,

    /// Global alerting thresholds.
    pub thresholds: AlertThresholds,

    /// Circuit breaker defaults shared by all breakers.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Priority tier of a monitored target.
///
/// Critical targets are probed in their own batch ahead of everything else
/// and carry the highest weight in the fleet health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl PriorityTier {
    /// Weight used in the priority-weighted fleet health score.
    pub fn weight(self) -> f64 {
        match self {
            PriorityTier::Critical => 3.0,
            PriorityTier::High => 2.0,
            PriorityTier::Medium => 1.5,
            PriorityTier::Low => 1.0,
        }
    }
}

/// How a target is probed.
///
/// A closed set: an unknown probe kind is a deserialization error, not a
/// silent no-op at collection time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TargetKind {
    /// HTTP GET against a URL; any 2xx counts as alive.
    Http { url: String },
    /// Plain TCP connect against host:port.
    Tcp { address: String },
}

/// A single monitored target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Unique target identifier.
    pub name: String,

    /// Probe endpoint.
    #[serde(flatten)]
    pub kind: TargetKind,

    /// Priority tier (default: medium).
    #[serde(default)]
    pub priority: PriorityTier,

    /// Latency above this is degraded; above 1.5x is unhealthy.
    #[serde(default = "default_response_time_threshold_ms")]
    pub response_time_threshold_ms: f64,

    /// Per-target warning threshold for the rolling error rate.
    #[serde(default = "default_error_rate_threshold_pct")]
    pub error_rate_threshold_pct: f64,

    /// Probe retry attempts after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-attempt probe timeout in milliseconds.
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,

    /// Suggested collection interval in milliseconds (consumed by the driver).
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
}

impl TargetConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

fn default_response_time_threshold_ms() -> f64 {
    300.0
}

fn default_error_rate_threshold_pct() -> f64 {
    5.0
}

fn default_max_retries() -> u32 {
    2
}

fn default_check_timeout_ms() -> u64 {
    5_000
}

fn default_check_interval_ms() -> u64 {
    15_000
}

/// Collector settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Sample cache TTL in seconds; a fresh entry skips the probe.
    pub cache_ttl_secs: u64,

    /// Bounded per-target history depth.
    pub history_size: usize,
}

impl CollectorConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 15,
            history_size: 100,
        }
    }
}

/// Global alert thresholds; per-target overrides tighten the warning level.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Response time warning threshold in milliseconds.
    pub response_time_warning_ms: f64,

    /// Response time critical threshold in milliseconds.
    pub response_time_critical_ms: f64,

    /// Error rate warning threshold in percent.
    pub error_rate_warning_pct: f64,

    /// Error rate critical threshold in percent.
    pub error_rate_critical_pct: f64,

    /// Uptime below this raises a warning.
    pub availability_warning_pct: f64,

    /// Uptime below this is critical.
    pub availability_critical_pct: f64,

    /// Consecutive failures at or above this raise a warning.
    pub consecutive_failures_warning: u32,

    /// Consecutive failures at or above this are critical.
    pub consecutive_failures_critical: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            response_time_warning_ms: 300.0,
            response_time_critical_ms: 500.0,
            error_rate_warning_pct: 5.0,
            error_rate_critical_pct: 10.0,
            availability_warning_pct: 95.0,
            availability_critical_pct: 90.0,
            consecutive_failures_warning: 3,
            consecutive_failures_critical: 5,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in Closed before the breaker opens.
    pub failure_threshold: u32,

    /// Seconds an open breaker waits before admitting trial calls.
    pub reset_timeout_secs: u64,

    /// Trial calls admitted while half-open before further calls are rejected.
    pub half_open_max_calls: u32,

    /// Consecutive successes while half-open that close the breaker.
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 60,
            half_open_max_calls: 3,
            success_threshold: 2,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "fleetwatch=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9184".to_string(),
        }
    }
}
