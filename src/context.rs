//! Explicit pipeline context.
//!
//! One `MonitorContext` is constructed at process start from a validated
//! configuration and passed by handle to whatever front end drives the
//! pipeline. There are no global singletons; dropping the context tears the
//! whole pipeline down.

use std::collections::HashMap;

use crate::collector::{
    CollectError, HealthCheckResult, MetricSample, MetricsCollector, NetworkProber,
};
use crate::config::MonitorConfig;
use crate::processor::{MetricsProcessor, ProcessedReport};
use crate::resilience::CircuitBreakerManager;

/// Owns the collector, processor and breaker registry for one fleet.
pub struct MonitorContext {
    config: MonitorConfig,
    collector: MetricsCollector<NetworkProber>,
    processor: MetricsProcessor,
    breakers: CircuitBreakerManager,
}

impl MonitorContext {
    pub fn new(config: MonitorConfig) -> Self {
        let collector = MetricsCollector::new(config.targets.clone(), &config.collector);
        let processor = MetricsProcessor::new(config.thresholds.clone(), &config.targets);
        let breakers = CircuitBreakerManager::new(config.circuit_breaker);

        Self {
            config,
            collector,
            processor,
            breakers,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn collector(&self) -> &MetricsCollector<NetworkProber> {
        &self.collector
    }

    pub fn processor(&self) -> &MetricsProcessor {
        &self.processor
    }

    pub fn breakers(&self) -> &CircuitBreakerManager {
        &self.breakers
    }

    pub async fn collect_all(&self) -> HashMap<String, MetricSample> {
        self.collector.collect_all().await
    }

    pub async fn collect_specific(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, MetricSample>, CollectError> {
        self.collector.collect_specific(names).await
    }

    pub async fn health_check_all(&self) -> HashMap<String, HealthCheckResult> {
        self.collector.health_check_all().await
    }

    pub fn process(&self, samples: &HashMap<String, MetricSample>) -> ProcessedReport {
        self.processor.process(samples)
    }

    /// Collect a full batch and process it in one step.
    pub async fn snapshot(&self) -> ProcessedReport {
        let samples = self.collect_all().await;
        self.process(&samples)
    }
}
