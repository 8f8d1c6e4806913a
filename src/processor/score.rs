//! Health and data-quality scoring.

use std::collections::HashMap;

use crate::collector::history::round2;
use crate::collector::sample::{MetricSample, TargetStatus};
use crate::config::PriorityTier;

/// Score one target 0-100: start at 100 and subtract capped penalties for
/// latency above 100ms, the rolling error rate, and the failure streak.
/// `Unknown` carries no usable signal and scores zero.
pub(crate) fn target_health_score(sample: &MetricSample) -> f64 {
    if sample.status == TargetStatus::Unknown {
        return 0.0;
    }

    let mut score = 100.0;

    let response_penalty = if !sample.response_time_ms.is_finite() {
        30.0
    } else if sample.response_time_ms > 100.0 {
        ((sample.response_time_ms - 100.0) / 10.0).min(30.0)
    } else {
        0.0
    };
    score -= response_penalty;

    if sample.error_rate_pct > 0.0 {
        score -= (sample.error_rate_pct * 2.0).min(20.0);
    }

    if sample.consecutive_failures > 0 {
        score -= (sample.consecutive_failures as f64 * 5.0).min(25.0);
    }

    score.clamp(0.0, 100.0)
}

/// Priority-weighted mean of per-target scores; zero with no samples.
pub(crate) fn fleet_health_score(
    samples: &HashMap<String, MetricSample>,
    priorities: &HashMap<String, PriorityTier>,
) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut total_score = 0.0;
    let mut total_weight = 0.0;
    for (name, sample) in samples {
        let weight = priorities
            .get(name)
            .copied()
            .unwrap_or_default()
            .weight();
        total_score += target_health_score(sample) * weight;
        total_weight += weight;
    }

    round2(total_score / total_weight)
}

/// 0-100 share of samples that carry a trustworthy measurement: finite
/// latency and no probe error.
pub(crate) fn data_quality_score(samples: &HashMap<String, MetricSample>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let good = samples
        .values()
        .filter(|s| s.response_time_ms.is_finite() && s.error_message.is_none())
        .count();

    round2(good as f64 / samples.len() as f64 * 100.0)
}
