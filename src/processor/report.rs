//! Operator-facing report types.
//!
//! A `ProcessedReport` is derived fresh from one batch of samples; nothing
//! in it is retained between processing passes.

use serde::Serialize;

use crate::processor::alerts::Alert;

/// Complete processed view over one collection batch.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedReport {
    pub summary: ReportSummary,
    pub classification: Classification,
    /// Sorted critical, then warning, then info.
    pub alerts: Vec<Alert>,
    pub trends: Trends,
    pub performance: PerformanceSummary,
    /// At most five entries, priority-ordered.
    pub recommendations: Vec<Recommendation>,
    /// 0-100: share of samples with a finite latency and no probe error.
    pub data_quality_score: f64,
    /// Unix timestamp in milliseconds.
    pub processed_at_ms: u64,
}

/// Headline counts and the fleet score.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub total_targets: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub unhealthy_count: usize,
    pub unknown_count: usize,
    /// Priority-weighted fleet health, 0-100.
    pub overall_health_score: f64,
    /// Mean over finite response times; 0 when none were finite.
    pub average_response_time_ms: f64,
}

/// Target names bucketed by observed status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub healthy: Vec<String>,
    pub degraded: Vec<String>,
    pub unhealthy: Vec<String>,
    pub unknown: Vec<String>,
}

/// Shortlists an operator should look at first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trends {
    /// Top healthy targets by ascending latency.
    pub top_performers: Vec<String>,
    /// Degraded/unhealthy targets by descending failure streak.
    pub attention_needed: Vec<String>,
}

/// Aggregate performance statistics over the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceSummary {
    pub response_time: ResponseTimeSummary,
    pub availability: AvailabilitySummary,
    pub reliability: ReliabilitySummary,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseTimeSummary {
    pub average_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub target_ms: f64,
    /// Share of targets at or under the target latency.
    pub achievement_rate_pct: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AvailabilitySummary {
    pub average_pct: f64,
    pub target_pct: f64,
    pub targets_meeting_target: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReliabilitySummary {
    pub average_error_rate_pct: f64,
    pub targets_with_errors: usize,
    pub targets_with_failure_streaks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    CriticalIssues,
    Performance,
    Reliability,
    DataCollection,
}

/// One ranked, actionable suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub category: RecommendationCategory,
    pub title: String,
    pub action: String,
    pub affected_targets: Vec<String>,
}
