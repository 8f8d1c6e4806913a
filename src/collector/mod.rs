//! Metrics collection subsystem.
//!
//! # Data Flow
//! ```text
//! collect_all()
//!     → partition targets: critical batch, remaining batch
//!     → fan out one probe task per target (critical batch awaited first)
//!     → per target: cache check → timed probe with retries → classify
//!     → probe failure collapses to a synthetic unhealthy sample
//!     → sample appended to bounded history, cache refreshed
//!     → Map<name, MetricSample>
//! ```
//!
//! # Design Decisions
//! - One bad target never fails the batch; errors become unhealthy samples
//! - Cache and history slots are written only by the owning target's task
//! - Probing sits behind the `Prober` trait so tests can script outcomes

pub mod cache;
pub mod history;
pub mod probe;
pub mod sample;

use std::collections::HashMap;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::{CollectorConfig, PriorityTier, TargetConfig};
use crate::observability::metrics;

pub use cache::{CacheStats, SampleCache};
pub use history::HistoryStore;
pub use probe::{NetworkProber, ProbeError, ProbeSuccess, Prober};
pub use sample::{now_ms, HealthCheckResult, MetricSample, TargetStatus};

/// Caller-input errors surfaced from collection entry points.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectError {
    #[error("unknown target '{name}'")]
    UnknownTarget { name: String },
}

/// Concurrent health-metrics collector for a fixed fleet of targets.
pub struct MetricsCollector<P: Prober = NetworkProber> {
    targets: HashMap<String, TargetConfig>,
    prober: P,
    cache: SampleCache,
    history: HistoryStore,
}

impl MetricsCollector<NetworkProber> {
    pub fn new(targets: Vec<TargetConfig>, settings: &CollectorConfig) -> Self {
        Self::with_prober(targets, settings, NetworkProber::new())
    }
}

impl<P: Prober> MetricsCollector<P> {
    /// Build a collector with a custom prober (the seam used by tests).
    pub fn with_prober(targets: Vec<TargetConfig>, settings: &CollectorConfig, prober: P) -> Self {
        let targets = targets
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect::<HashMap<_, _>>();

        Self {
            targets,
            prober,
            cache: SampleCache::new(settings.cache_ttl()),
            history: HistoryStore::new(settings.history_size),
        }
    }

    /// Collect a fresh sample for every configured target.
    ///
    /// Critical-priority targets are probed as their own fully-awaited batch
    /// so their freshness is never delayed by slower, less important
    /// targets. Within a batch every target is probed concurrently.
    pub async fn collect_all(&self) -> HashMap<String, MetricSample> {
        let (critical, rest): (Vec<&TargetConfig>, Vec<&TargetConfig>) = self
            .targets
            .values()
            .partition(|t| t.priority == PriorityTier::Critical);

        tracing::debug!(
            critical = critical.len(),
            rest = rest.len(),
            "Starting collection cycle"
        );

        let mut samples = HashMap::with_capacity(self.targets.len());
        for batch in [critical, rest] {
            if batch.is_empty() {
                continue;
            }
            let results = join_all(batch.into_iter().map(|t| self.collect_target(t))).await;
            for sample in results {
                samples.insert(sample.target.clone(), sample);
            }
        }

        samples
    }

    /// Collect samples for a caller-supplied subset of targets.
    ///
    /// The whole subset is validated before any probe runs; an unknown name
    /// fails the call without side effects.
    pub async fn collect_specific(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, MetricSample>, CollectError> {
        let mut batch = Vec::with_capacity(names.len());
        for name in names {
            match self.targets.get(name) {
                Some(target) => batch.push(target),
                None => {
                    return Err(CollectError::UnknownTarget { name: name.clone() });
                }
            }
        }

        let results = join_all(batch.into_iter().map(|t| self.collect_target(t))).await;
        Ok(results
            .into_iter()
            .map(|s| (s.target.clone(), s))
            .collect())
    }

    /// Lightweight liveness check for every target: one probe attempt, no
    /// retries, and no cache or history side effects.
    pub async fn health_check_all(&self) -> HashMap<String, HealthCheckResult> {
        let checks = self.targets.values().map(|target| async move {
            let result = match timeout(target.check_timeout(), self.prober.probe(target)).await {
                Ok(Ok(success)) => HealthCheckResult {
                    status: TargetStatus::Healthy,
                    response_time_ms: success.response_time_ms,
                    timestamp_ms: now_ms(),
                    error: None,
                },
                Ok(Err(e)) => HealthCheckResult {
                    status: TargetStatus::Unhealthy,
                    response_time_ms: f64::INFINITY,
                    timestamp_ms: now_ms(),
                    error: Some(e.to_string()),
                },
                Err(_) => HealthCheckResult {
                    status: TargetStatus::Unhealthy,
                    response_time_ms: f64::INFINITY,
                    timestamp_ms: now_ms(),
                    error: Some(
                        ProbeError::Timeout {
                            after_ms: target.check_timeout_ms,
                        }
                        .to_string(),
                    ),
                },
            };
            (target.name.clone(), result)
        });

        join_all(checks).await.into_iter().collect()
    }

    /// One target's collection task: cache check, probe, sample synthesis.
    async fn collect_target(&self, target: &TargetConfig) -> MetricSample {
        if let Some(sample) = self.cache.get_fresh(&target.name) {
            tracing::trace!(target = %target.name, "Serving sample from cache");
            metrics::record_cache_read(&target.name, true);
            self.history.push(sample.clone());
            return sample;
        }
        metrics::record_cache_read(&target.name, false);

        let sample = match self.probe_with_retries(target).await {
            Ok(success) => self.sample_from_success(target, success),
            Err(error) => self.sample_from_failure(target, &error),
        };

        metrics::record_sample(&sample);
        self.history.push(sample.clone());
        self.cache.insert(sample.clone());
        sample
    }

    /// Probe once plus up to `max_retries` retried attempts, each bounded by
    /// the target's timeout, with jittered backoff in between.
    async fn probe_with_retries(&self, target: &TargetConfig) -> Result<ProbeSuccess, ProbeError> {
        let mut last_error = ProbeError::Connection("no probe attempted".into());

        for attempt in 0..=target.max_retries {
            let delay = probe::retry_delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match timeout(target.check_timeout(), self.prober.probe(target)).await {
                Ok(Ok(success)) => return Ok(success),
                Ok(Err(e)) => {
                    tracing::debug!(
                        target = %target.name,
                        attempt,
                        error = %e,
                        "Probe attempt failed"
                    );
                    last_error = e;
                }
                Err(_) => {
                    tracing::debug!(
                        target = %target.name,
                        attempt,
                        timeout_ms = target.check_timeout_ms,
                        "Probe attempt timed out"
                    );
                    last_error = ProbeError::Timeout {
                        after_ms: target.check_timeout_ms,
                    };
                }
            }
        }

        Err(last_error)
    }

    fn sample_from_success(&self, target: &TargetConfig, success: ProbeSuccess) -> MetricSample {
        let latency = success.response_time_ms;
        let status = if latency <= target.response_time_threshold_ms {
            TargetStatus::Healthy
        } else if latency <= target.response_time_threshold_ms * 1.5 {
            TargetStatus::Degraded
        } else {
            TargetStatus::Unhealthy
        };

        let stats = self.history.rolling_stats(&target.name, status.is_healthy());
        let consecutive_failures = if status.is_healthy() {
            0
        } else {
            stats.failure_streak + 1
        };

        MetricSample {
            target: target.name.clone(),
            status,
            response_time_ms: latency,
            error_rate_pct: stats.error_rate_pct,
            consecutive_failures,
            uptime_pct: stats.uptime_pct,
            last_check_ms: now_ms(),
            cpu_pct: success.cpu_pct,
            memory_mb: success.memory_mb,
            error_message: None,
        }
    }

    fn sample_from_failure(&self, target: &TargetConfig, error: &ProbeError) -> MetricSample {
        let stats = self.history.rolling_stats(&target.name, false);

        tracing::warn!(
            target = %target.name,
            error = %error,
            consecutive_failures = stats.failure_streak + 1,
            "Target probe failed"
        );

        MetricSample {
            target: target.name.clone(),
            status: TargetStatus::Unhealthy,
            response_time_ms: f64::INFINITY,
            error_rate_pct: stats.error_rate_pct,
            consecutive_failures: stats.failure_streak + 1,
            uptime_pct: stats.uptime_pct,
            last_check_ms: now_ms(),
            cpu_pct: None,
            memory_mb: None,
            error_message: Some(error.to_string()),
        }
    }

    /// Most recent `limit` samples for one target, oldest first.
    pub fn history(&self, target: &str, limit: usize) -> Vec<MetricSample> {
        self.history.recent(target, limit)
    }

    pub fn history_len(&self, target: &str) -> usize {
        self.history.len(target)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The static target definitions this collector owns.
    pub fn targets(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.values()
    }
}
