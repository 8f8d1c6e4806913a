//! Threshold-based alert evaluation.
//!
//! Four independent rules per target: response time, error rate,
//! availability, consecutive failures. Each is checked against the global
//! thresholds, with per-target overrides tightening the warning level. A
//! critical breach supersedes a warning for the same metric on the same
//! target.

use serde::Serialize;

use crate::collector::sample::{now_ms, MetricSample};
use crate::config::AlertThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Which measurement breached its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    ResponseTime,
    ErrorRate,
    Availability,
    ConsecutiveFailures,
}

/// One threshold breach, created fresh each processing pass.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub severity: Severity,
    pub target: String,
    pub metric: AlertMetric,
    pub current_value: f64,
    pub threshold_value: f64,
    pub message: String,
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
}

/// Per-target warning-level overrides taken from the target's config.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TargetOverrides {
    pub response_time_warning_ms: f64,
    pub error_rate_warning_pct: f64,
}

/// Evaluate all four rules for one sample.
pub(crate) fn evaluate_sample(
    sample: &MetricSample,
    thresholds: &AlertThresholds,
    overrides: Option<TargetOverrides>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let timestamp_ms = now_ms();
    let alert = |severity, metric, current_value: f64, threshold_value: f64, message: String| Alert {
        severity,
        target: sample.target.clone(),
        metric,
        current_value,
        threshold_value,
        message,
        timestamp_ms,
    };

    let response_warning = overrides
        .map(|o| o.response_time_warning_ms)
        .unwrap_or(thresholds.response_time_warning_ms);
    let error_warning = overrides
        .map(|o| o.error_rate_warning_pct)
        .unwrap_or(thresholds.error_rate_warning_pct);

    // An unreachable target has no meaningful latency; the failure shows up
    // through the other three rules instead.
    if sample.response_time_ms.is_finite() {
        if sample.response_time_ms > thresholds.response_time_critical_ms {
            alerts.push(alert(
                Severity::Critical,
                AlertMetric::ResponseTime,
                sample.response_time_ms,
                thresholds.response_time_critical_ms,
                format!(
                    "Critical response time: {:.1}ms > {:.0}ms",
                    sample.response_time_ms, thresholds.response_time_critical_ms
                ),
            ));
        } else if sample.response_time_ms > response_warning {
            alerts.push(alert(
                Severity::Warning,
                AlertMetric::ResponseTime,
                sample.response_time_ms,
                response_warning,
                format!(
                    "High response time: {:.1}ms > {:.0}ms",
                    sample.response_time_ms, response_warning
                ),
            ));
        }
    }

    if sample.error_rate_pct > thresholds.error_rate_critical_pct {
        alerts.push(alert(
            Severity::Critical,
            AlertMetric::ErrorRate,
            sample.error_rate_pct,
            thresholds.error_rate_critical_pct,
            format!(
                "Critical error rate: {:.1}% > {:.0}%",
                sample.error_rate_pct, thresholds.error_rate_critical_pct
            ),
        ));
    } else if sample.error_rate_pct > error_warning {
        alerts.push(alert(
            Severity::Warning,
            AlertMetric::ErrorRate,
            sample.error_rate_pct,
            error_warning,
            format!(
                "High error rate: {:.1}% > {:.0}%",
                sample.error_rate_pct, error_warning
            ),
        ));
    }

    if sample.uptime_pct < thresholds.availability_critical_pct {
        alerts.push(alert(
            Severity::Critical,
            AlertMetric::Availability,
            sample.uptime_pct,
            thresholds.availability_critical_pct,
            format!(
                "Critical availability: {:.1}% < {:.0}%",
                sample.uptime_pct, thresholds.availability_critical_pct
            ),
        ));
    } else if sample.uptime_pct < thresholds.availability_warning_pct {
        alerts.push(alert(
            Severity::Warning,
            AlertMetric::Availability,
            sample.uptime_pct,
            thresholds.availability_warning_pct,
            format!(
                "Low availability: {:.1}% < {:.0}%",
                sample.uptime_pct, thresholds.availability_warning_pct
            ),
        ));
    }

    if sample.consecutive_failures >= thresholds.consecutive_failures_critical {
        alerts.push(alert(
            Severity::Critical,
            AlertMetric::ConsecutiveFailures,
            sample.consecutive_failures as f64,
            thresholds.consecutive_failures_critical as f64,
            format!("Critical: {} consecutive failures", sample.consecutive_failures),
        ));
    } else if sample.consecutive_failures >= thresholds.consecutive_failures_warning {
        alerts.push(alert(
            Severity::Warning,
            AlertMetric::ConsecutiveFailures,
            sample.consecutive_failures as f64,
            thresholds.consecutive_failures_warning as f64,
            format!("Warning: {} consecutive failures", sample.consecutive_failures),
        ));
    }

    alerts
}
