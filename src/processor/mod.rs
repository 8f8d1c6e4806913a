//! Metrics processing subsystem.
//!
//! # Data Flow
//! ```text
//! process(samples)
//!     → classify targets by status
//!     → evaluate alert rules (global thresholds + per-target overrides)
//!     → score each target, weight into the fleet score
//!     → derive trends, performance summary, recommendations
//!     → ProcessedReport (purely derived, no retained state)
//! ```
//!
//! # Design Decisions
//! - Processing never fails: malformed or missing data degrades the
//!   data-quality score instead of aborting the batch
//! - An empty batch yields a zero-confidence report, not an error

pub mod alerts;
pub mod report;
mod score;

use std::collections::HashMap;

use crate::collector::history::round2;
use crate::collector::sample::{now_ms, MetricSample, TargetStatus};
use crate::config::{AlertThresholds, PriorityTier, TargetConfig};
use crate::processor::alerts::{evaluate_sample, TargetOverrides};
pub use crate::processor::report::{
    AvailabilitySummary, Classification, PerformanceSummary, ProcessedReport, Recommendation,
    RecommendationCategory, RecommendationPriority, ReliabilitySummary, ReportSummary,
    ResponseTimeSummary, Trends,
};

pub use alerts::{Alert, AlertMetric, Severity};
pub use report::*;

/// Response-time goal used in the performance summary.
const RESPONSE_TIME_TARGET_MS: f64 = 150.0;
/// Availability goal used in the performance summary.
const AVAILABILITY_TARGET_PCT: f64 = 99.5;
/// Upper bound on emitted recommendations.
const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy)]
struct TargetMeta {
    priority: PriorityTier,
    overrides: TargetOverrides,
}

/// Turns a batch of samples into an operator-facing report.
pub struct MetricsProcessor {
    thresholds: AlertThresholds,
    targets: HashMap<String, TargetMeta>,
}

impl MetricsProcessor {
    pub fn new(thresholds: AlertThresholds, targets: &[TargetConfig]) -> Self {
        let targets = targets
            .iter()
            .map(|t| {
                (
                    t.name.clone(),
                    TargetMeta {
                        priority: t.priority,
                        overrides: TargetOverrides {
                            response_time_warning_ms: t.response_time_threshold_ms,
                            error_rate_warning_pct: t.error_rate_threshold_pct,
                        },
                    },
                )
            })
            .collect();

        Self {
            thresholds,
            targets,
        }
    }

    /// Process one batch. Infallible: an empty batch produces a
    /// zero-confidence report rather than an error.
    pub fn process(&self, samples: &HashMap<String, MetricSample>) -> ProcessedReport {
        if samples.is_empty() {
            return self.insufficient_data_report();
        }

        let classification = classify(samples);
        let alerts = self.evaluate_alerts(samples);
        let priorities: HashMap<String, PriorityTier> = self
            .targets
            .iter()
            .map(|(name, meta)| (name.clone(), meta.priority))
            .collect();
        let overall_health_score = score::fleet_health_score(samples, &priorities);
        let performance = performance_summary(samples);
        let trends = trends(samples);
        let recommendations = self.recommendations(samples, &alerts);
        let data_quality_score = score::data_quality_score(samples);

        let summary = ReportSummary {
            total_targets: samples.len(),
            healthy_count: classification.healthy.len(),
            degraded_count: classification.degraded.len(),
            unhealthy_count: classification.unhealthy.len(),
            unknown_count: classification.unknown.len(),
            overall_health_score,
            average_response_time_ms: performance.response_time.average_ms,
        };

        tracing::debug!(
            targets = summary.total_targets,
            score = summary.overall_health_score,
            alerts = alerts.len(),
            "Processed metrics batch"
        );

        ProcessedReport {
            summary,
            classification,
            alerts,
            trends,
            performance,
            recommendations,
            data_quality_score,
            processed_at_ms: now_ms(),
        }
    }

    /// Health score for one sample, exposed for report consumers.
    pub fn target_score(&self, sample: &MetricSample) -> f64 {
        score::target_health_score(sample)
    }

    fn evaluate_alerts(&self, samples: &HashMap<String, MetricSample>) -> Vec<Alert> {
        let mut names: Vec<&String> = samples.keys().collect();
        names.sort();

        let mut alerts = Vec::new();
        for name in names {
            let sample = &samples[name];
            let overrides = self.targets.get(name).map(|m| m.overrides);
            alerts.extend(evaluate_sample(sample, &self.thresholds, overrides));
        }

        alerts.sort_by_key(|a| a.severity);
        alerts
    }

    fn recommendations(
        &self,
        samples: &HashMap<String, MetricSample>,
        alerts: &[Alert],
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        let mut critical_targets: Vec<String> = alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .map(|a| a.target.clone())
            .collect();
        critical_targets.sort();
        critical_targets.dedup();
        if !critical_targets.is_empty() {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::High,
                category: RecommendationCategory::CriticalIssues,
                title: format!(
                    "{} target(s) need immediate attention",
                    critical_targets.len()
                ),
                action: "Check the affected targets and start recovery now.".into(),
                affected_targets: critical_targets,
            });
        }

        let mut slow: Vec<String> = samples
            .values()
            .filter(|s| {
                s.response_time_ms.is_finite()
                    && s.response_time_ms > self.thresholds.response_time_warning_ms
            })
            .map(|s| s.target.clone())
            .collect();
        slow.sort();
        if !slow.is_empty() {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::Medium,
                category: RecommendationCategory::Performance,
                title: format!("{} target(s) respond slowly", slow.len()),
                action: "Review resource allocation or consider optimization.".into(),
                affected_targets: slow,
            });
        }

        let mut unreliable: Vec<String> = samples
            .values()
            .filter(|s| s.uptime_pct < self.thresholds.availability_warning_pct)
            .map(|s| s.target.clone())
            .collect();
        unreliable.sort();
        if !unreliable.is_empty() {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::Medium,
                category: RecommendationCategory::Reliability,
                title: format!("{} target(s) have low uptime", unreliable.len()),
                action: "Review target configuration and tighten monitoring.".into(),
                affected_targets: unreliable,
            });
        }

        recommendations.truncate(MAX_RECOMMENDATIONS);
        recommendations
    }

    fn insufficient_data_report(&self) -> ProcessedReport {
        ProcessedReport {
            summary: ReportSummary::default(),
            classification: Classification::default(),
            alerts: Vec::new(),
            trends: Trends::default(),
            performance: PerformanceSummary {
                response_time: ResponseTimeSummary {
                    target_ms: RESPONSE_TIME_TARGET_MS,
                    ..Default::default()
                },
                availability: AvailabilitySummary {
                    target_pct: AVAILABILITY_TARGET_PCT,
                    ..Default::default()
                },
                reliability: ReliabilitySummary::default(),
            },
            recommendations: vec![Recommendation {
                priority: RecommendationPriority::High,
                category: RecommendationCategory::DataCollection,
                title: "No samples to process".into(),
                action: "Verify that collection is running and targets are configured.".into(),
                affected_targets: Vec::new(),
            }],
            data_quality_score: 0.0,
            processed_at_ms: now_ms(),
        }
    }
}

fn classify(samples: &HashMap<String, MetricSample>) -> Classification {
    let mut classification = Classification::default();
    let mut names: Vec<&String> = samples.keys().collect();
    names.sort();

    for name in names {
        let bucket = match samples[name].status {
            TargetStatus::Healthy => &mut classification.healthy,
            TargetStatus::Degraded => &mut classification.degraded,
            TargetStatus::Unhealthy => &mut classification.unhealthy,
            TargetStatus::Unknown => &mut classification.unknown,
        };
        bucket.push(name.clone());
    }

    classification
}

fn trends(samples: &HashMap<String, MetricSample>) -> Trends {
    let mut healthy: Vec<&MetricSample> = samples
        .values()
        .filter(|s| s.status.is_healthy() && s.response_time_ms.is_finite())
        .collect();
    healthy.sort_by(|a, b| {
        a.response_time_ms
            .partial_cmp(&b.response_time_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut struggling: Vec<&MetricSample> = samples
        .values()
        .filter(|s| matches!(s.status, TargetStatus::Degraded | TargetStatus::Unhealthy))
        .collect();
    struggling.sort_by(|a, b| b.consecutive_failures.cmp(&a.consecutive_failures));

    Trends {
        top_performers: healthy.iter().take(3).map(|s| s.target.clone()).collect(),
        attention_needed: struggling.iter().take(3).map(|s| s.target.clone()).collect(),
    }
}

fn performance_summary(samples: &HashMap<String, MetricSample>) -> PerformanceSummary {
    let mut finite: Vec<f64> = samples
        .values()
        .map(|s| s.response_time_ms)
        .filter(|ms| ms.is_finite())
        .collect();
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let response_time = if finite.is_empty() {
        ResponseTimeSummary {
            target_ms: RESPONSE_TIME_TARGET_MS,
            ..Default::default()
        }
    } else {
        let average = finite.iter().sum::<f64>() / finite.len() as f64;
        let median = if finite.len() % 2 == 1 {
            finite[finite.len() / 2]
        } else {
            (finite[finite.len() / 2 - 1] + finite[finite.len() / 2]) / 2.0
        };
        let meeting_target = finite
            .iter()
            .filter(|&&ms| ms <= RESPONSE_TIME_TARGET_MS)
            .count();

        ResponseTimeSummary {
            average_ms: round2(average),
            median_ms: round2(median),
            min_ms: finite[0],
            max_ms: finite[finite.len() - 1],
            target_ms: RESPONSE_TIME_TARGET_MS,
            achievement_rate_pct: round2(meeting_target as f64 / samples.len() as f64 * 100.0),
        }
    };

    let average_uptime =
        samples.values().map(|s| s.uptime_pct).sum::<f64>() / samples.len() as f64;
    let availability = AvailabilitySummary {
        average_pct: round2(average_uptime),
        target_pct: AVAILABILITY_TARGET_PCT,
        targets_meeting_target: samples
            .values()
            .filter(|s| s.uptime_pct >= AVAILABILITY_TARGET_PCT)
            .count(),
    };

    let average_error_rate =
        samples.values().map(|s| s.error_rate_pct).sum::<f64>() / samples.len() as f64;
    let reliability = ReliabilitySummary {
        average_error_rate_pct: round2(average_error_rate),
        targets_with_errors: samples.values().filter(|s| s.error_rate_pct > 0.0).count(),
        targets_with_failure_streaks: samples
            .values()
            .filter(|s| s.consecutive_failures > 0)
            .count(),
    };

    PerformanceSummary {
        response_time,
        availability,
        reliability,
    }
}
