//! Collector-to-processor integration tests with scripted probes.

use std::collections::HashMap;

use fleetwatch::collector::{CollectError, MetricsCollector, TargetStatus};
use fleetwatch::config::{AlertThresholds, CircuitBreakerConfig, PriorityTier, TargetConfig};
use fleetwatch::processor::{AlertMetric, MetricsProcessor, RecommendationCategory, Severity};
use fleetwatch::resilience::{CircuitBreakerManager, CircuitState};

mod common;
use common::{settings, target, Outcome, ScriptedProber};

fn collector(
    targets: Vec<TargetConfig>,
    cache_ttl_secs: u64,
    history_size: usize,
) -> (MetricsCollector<ScriptedProber>, ScriptedProber) {
    let prober = ScriptedProber::new();
    let collector = MetricsCollector::with_prober(
        targets,
        &settings(cache_ttl_secs, history_size),
        prober.clone(),
    );
    (collector, prober)
}

#[tokio::test]
async fn one_failing_target_never_fails_the_batch() {
    let (collector, prober) = collector(
        vec![
            target("api", PriorityTier::Critical),
            target("db", PriorityTier::High),
            target("cache", PriorityTier::Medium),
            target("batch", PriorityTier::Low),
        ],
        60,
        100,
    );
    prober.script("db", Outcome::Fail("connection refused"));

    let samples = collector.collect_all().await;

    assert_eq!(samples.len(), 4);
    for name in ["api", "cache", "batch"] {
        assert_eq!(samples[name].status, TargetStatus::Healthy);
        assert!(samples[name].error_message.is_none());
    }

    let failed = &samples["db"];
    assert_eq!(failed.status, TargetStatus::Unhealthy);
    assert_eq!(failed.consecutive_failures, 1);
    assert!(failed.response_time_ms.is_infinite());
    assert!(failed
        .error_message
        .as_deref()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn cache_hit_skips_the_probe_and_returns_identical_samples() {
    let (collector, prober) = collector(
        vec![target("api", PriorityTier::Medium)],
        60,
        100,
    );

    let first = collector.collect_all().await;
    let second = collector.collect_all().await;

    assert_eq!(prober.calls("api"), 1);
    assert_eq!(first["api"], second["api"]);
}

#[tokio::test]
async fn expired_cache_triggers_a_fresh_probe() {
    let (collector, prober) = collector(vec![target("api", PriorityTier::Medium)], 0, 100);

    collector.collect_all().await;
    collector.collect_all().await;

    assert_eq!(prober.calls("api"), 2);
}

#[tokio::test]
async fn history_is_bounded_and_keeps_the_most_recent() {
    let (collector, _prober) = collector(vec![target("api", PriorityTier::Medium)], 0, 5);
    let names = vec!["api".to_string()];

    for _ in 0..12 {
        collector.collect_specific(&names).await.unwrap();
    }

    assert_eq!(collector.history_len("api"), 5);
    let recent = collector.history("api", 50);
    assert_eq!(recent.len(), 5);
    // Insertion order preserved.
    for pair in recent.windows(2) {
        assert!(pair[0].last_check_ms <= pair[1].last_check_ms);
    }
}

#[tokio::test]
async fn probe_timeout_becomes_a_synthetic_unhealthy_sample() {
    let (collector, prober) = collector(vec![target("api", PriorityTier::Medium)], 0, 100);
    prober.script("api", Outcome::Hang);

    let samples = collector.collect_all().await;

    let sample = &samples["api"];
    assert_eq!(sample.status, TargetStatus::Unhealthy);
    assert!(sample.response_time_ms.is_infinite());
    assert!(sample.error_message.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn slow_but_alive_targets_are_degraded_with_a_failure_streak() {
    let (collector, prober) = collector(vec![target("api", PriorityTier::Medium)], 0, 100);
    prober.script("api", Outcome::Latency(120.0));

    let samples = collector.collect_all().await;
    let sample = &samples["api"];
    assert_eq!(sample.status, TargetStatus::Degraded);
    // Non-healthy samples always carry a failure streak.
    assert_eq!(sample.consecutive_failures, 1);

    let again = collector.collect_all().await;
    assert_eq!(again["api"].consecutive_failures, 2);
}

#[tokio::test]
async fn unknown_target_is_rejected_before_any_probe() {
    let (collector, prober) = collector(vec![target("api", PriorityTier::Medium)], 60, 100);

    let err = collector
        .collect_specific(&["api".to_string(), "nope".to_string()])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CollectError::UnknownTarget {
            name: "nope".into()
        }
    );
    assert_eq!(prober.calls("api"), 0);
}

#[tokio::test]
async fn health_check_covers_every_target_without_side_effects() {
    let (collector, prober) = collector(
        vec![
            target("api", PriorityTier::Critical),
            target("db", PriorityTier::Medium),
        ],
        60,
        100,
    );
    prober.script("db", Outcome::Fail("no route to host"));

    let checks = collector.health_check_all().await;

    assert_eq!(checks.len(), 2);
    assert_eq!(checks["api"].status, TargetStatus::Healthy);
    assert_eq!(checks["db"].status, TargetStatus::Unhealthy);
    assert!(checks["db"].error.is_some());
    // The lightweight check leaves cache and history untouched.
    assert_eq!(collector.history_len("api"), 0);
    assert_eq!(collector.cache_stats().entries, 0);
}

#[tokio::test]
async fn critical_outage_scenario_end_to_end() {
    let mut targets = vec![
        target("db-primary", PriorityTier::Critical),
        target("auth", PriorityTier::Critical),
        target("gateway", PriorityTier::Critical),
    ];
    for i in 1..=7 {
        targets.push(target(&format!("worker-{}", i), PriorityTier::Low));
    }

    let (collector, prober) = collector(targets.clone(), 0, 100);
    prober.script("db-primary", Outcome::Hang);

    let breakers = CircuitBreakerManager::new(CircuitBreakerConfig {
        failure_threshold: 5,
        reset_timeout_secs: 60,
        half_open_max_calls: 3,
        success_threshold: 2,
    });

    let mut samples = HashMap::new();
    for _ in 0..5 {
        samples = collector.collect_all().await;
        assert_eq!(samples.len(), 10);

        // The front end couples probe outcomes to the breaker.
        let healthy = samples["db-primary"].status == TargetStatus::Healthy;
        let _ = breakers
            .call_with("db-primary", || async move {
                if healthy {
                    Ok(())
                } else {
                    Err("probe failed")
                }
            })
            .await;
    }

    assert_eq!(
        breakers.get_or_create("db-primary").state(),
        CircuitState::Open
    );
    assert_eq!(breakers.health_summary().unhealthy, 1);

    assert_eq!(samples["db-primary"].consecutive_failures, 5);

    let processor = MetricsProcessor::new(AlertThresholds::default(), &targets);
    let report = processor.process(&samples);

    let streak_criticals: Vec<_> = report
        .alerts
        .iter()
        .filter(|a| a.severity == Severity::Critical && a.metric == AlertMetric::ConsecutiveFailures)
        .collect();
    assert_eq!(streak_criticals.len(), 1);
    assert_eq!(streak_criticals[0].target, "db-primary");

    assert_eq!(
        report.recommendations[0].category,
        RecommendationCategory::CriticalIssues
    );
    assert!(report.recommendations[0]
        .affected_targets
        .contains(&"db-primary".to_string()));

    // An equivalent outage on a low-priority target hurts the fleet less.
    let mut swapped = samples.clone();
    let failing = swapped["db-primary"].clone();
    let healthy = swapped["worker-1"].clone();
    swapped.insert(
        "db-primary".to_string(),
        fleetwatch::MetricSample {
            target: "db-primary".into(),
            ..healthy
        },
    );
    swapped.insert(
        "worker-1".to_string(),
        fleetwatch::MetricSample {
            target: "worker-1".into(),
            ..failing
        },
    );

    let swapped_report = processor.process(&swapped);
    assert!(
        report.summary.overall_health_score < swapped_report.summary.overall_health_score,
        "critical outage must cost more than an equivalent low-priority outage"
    );
}
