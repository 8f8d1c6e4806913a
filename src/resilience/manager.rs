//! Circuit breaker registry.
//!
//! # Responsibilities
//! - Own one breaker per dependency name, lazily created with shared defaults
//! - Offer a one-call gate-and-record wrapper (`call_with`)
//! - Aggregate breaker states into a fleet-level health summary

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::config::CircuitBreakerConfig;
use crate::resilience::circuit_breaker::{
    CircuitBreaker, CircuitBreakerStats, CircuitError, CircuitState,
};

/// Bucketed label for the aggregate breaker score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Aggregate view over every registered breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerHealthSummary {
    /// Breakers currently closed.
    pub healthy: usize,
    /// Breakers currently half-open.
    pub degraded: usize,
    /// Breakers currently open.
    pub unhealthy: usize,
    /// 0-100 score: closed counts full, half-open counts half.
    pub overall_health: f64,
    pub status: FleetState,
}

/// Registry mapping dependency name to its circuit breaker.
pub struct CircuitBreakerManager {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    defaults: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(defaults: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            defaults,
        }
    }

    /// Fetch the breaker for `name`, creating it with the shared defaults on
    /// first use.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_create_with(name, self.defaults)
    }

    /// Fetch the breaker for `name`, creating it with an explicit
    /// configuration on first use. An existing breaker keeps the
    /// configuration it was created with.
    pub fn get_or_create_with(
        &self,
        name: &str,
        config: CircuitBreakerConfig,
    ) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, config)))
            .clone()
    }

    /// Run `f` through the named breaker.
    pub async fn call_with<F, Fut, T, E>(&self, name: &str, f: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.get_or_create(name).call(f).await
    }

    /// Like [`call_with`](Self::call_with), but a breaker created by this
    /// call uses `config` instead of the shared defaults.
    pub async fn call_with_config<F, Fut, T, E>(
        &self,
        name: &str,
        config: CircuitBreakerConfig,
        f: F,
    ) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.get_or_create_with(name, config).call(f).await
    }

    /// Count breakers by state and derive a 0-100 score, bucketed at 90/70.
    pub fn health_summary(&self) -> BreakerHealthSummary {
        let mut healthy = 0usize;
        let mut degraded = 0usize;
        let mut unhealthy = 0usize;

        for entry in self.breakers.iter() {
            match entry.value().state() {
                CircuitState::Closed => healthy += 1,
                CircuitState::HalfOpen => degraded += 1,
                CircuitState::Open => unhealthy += 1,
            }
        }

        let total = healthy + degraded + unhealthy;
        let overall_health = if total == 0 {
            // No registered dependencies means no known problems.
            100.0
        } else {
            (healthy as f64 * 100.0 + degraded as f64 * 50.0) / total as f64
        };

        let status = if overall_health >= 90.0 {
            FleetState::Healthy
        } else if overall_health >= 70.0 {
            FleetState::Degraded
        } else {
            FleetState::Unhealthy
        };

        BreakerHealthSummary {
            healthy,
            degraded,
            unhealthy,
            overall_health,
            status,
        }
    }

    /// Administrative override: force every breaker closed and clear its
    /// statistics.
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
        tracing::info!(breakers = self.breakers.len(), "All circuit breakers reset");
    }

    /// Pull-based snapshot of every breaker, for dashboards and the CLI.
    pub fn all_stats(&self) -> Vec<CircuitBreakerStats> {
        let mut stats: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| entry.value().stats())
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> CircuitBreakerManager {
        CircuitBreakerManager::new(CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout_secs: 60,
            half_open_max_calls: 3,
            success_threshold: 2,
        })
    }

    #[tokio::test]
    async fn breakers_are_created_lazily_and_reused() {
        let m = manager();
        assert!(m.is_empty());

        let a = m.get_or_create("db");
        let b = m.get_or_create("db");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(m.len(), 1);
    }

    #[tokio::test]
    async fn call_with_gates_after_threshold() {
        let m = manager();

        for _ in 0..2 {
            let r: Result<(), _> = m.call_with("db", || async { Err("down") }).await;
            assert!(matches!(r, Err(CircuitError::Inner(_))));
        }

        let r: Result<(), CircuitError<&str>> = m.call_with("db", || async { Ok(()) }).await;
        assert!(matches!(r, Err(CircuitError::Open { .. })));
    }

    #[tokio::test]
    async fn summary_counts_states_and_buckets() {
        let m = manager();

        let _ = m.call_with("ok", || async { Ok::<(), &str>(()) }).await;
        for _ in 0..2 {
            let _: Result<(), _> = m.call_with("down", || async { Err("x") }).await;
        }

        let summary = m.health_summary();
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.unhealthy, 1);
        assert_eq!(summary.overall_health, 50.0);
        assert_eq!(summary.status, FleetState::Unhealthy);
    }

    #[tokio::test]
    async fn empty_registry_reports_full_health() {
        let summary = manager().health_summary();
        assert_eq!(summary.overall_health, 100.0);
        assert_eq!(summary.status, FleetState::Healthy);
    }

    #[tokio::test]
    async fn reset_all_closes_everything() {
        let m = manager();
        for _ in 0..2 {
            let _: Result<(), _> = m.call_with("down", || async { Err("x") }).await;
        }
        assert_eq!(m.health_summary().unhealthy, 1);

        m.reset_all();
        let summary = m.health_summary();
        assert_eq!(summary.unhealthy, 0);
        assert_eq!(summary.healthy, 1);
    }
}
