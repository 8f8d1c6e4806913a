//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetwatch::collector::{ProbeError, ProbeSuccess, Prober};
use fleetwatch::config::{CollectorConfig, PriorityTier, TargetConfig, TargetKind};

/// Scripted outcome for one target's probes.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Outcome {
    /// Respond successfully with the given latency in milliseconds.
    Latency(f64),
    /// Fail with a connection error.
    Fail(&'static str),
    /// Never respond; the collector's per-attempt timeout fires.
    Hang,
}

#[derive(Debug, Default)]
struct Inner {
    outcomes: Mutex<HashMap<String, Outcome>>,
    calls: Mutex<HashMap<String, u32>>,
}

/// Prober that returns scripted outcomes and counts probe invocations.
/// Clones share the script and the counters.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProber {
    inner: Arc<Inner>,
}

#[allow(dead_code)]
impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outcome for a target; unscripted targets answer healthy at 10ms.
    pub fn script(&self, target: &str, outcome: Outcome) {
        self.inner
            .outcomes
            .lock()
            .unwrap()
            .insert(target.to_string(), outcome);
    }

    /// How many times a target has actually been probed.
    pub fn calls(&self, target: &str) -> u32 {
        self.inner
            .calls
            .lock()
            .unwrap()
            .get(target)
            .copied()
            .unwrap_or(0)
    }
}

impl Prober for ScriptedProber {
    async fn probe(&self, target: &TargetConfig) -> Result<ProbeSuccess, ProbeError> {
        {
            let mut calls = self.inner.calls.lock().unwrap();
            *calls.entry(target.name.clone()).or_insert(0) += 1;
        }

        let outcome = self
            .inner
            .outcomes
            .lock()
            .unwrap()
            .get(&target.name)
            .cloned()
            .unwrap_or(Outcome::Latency(10.0));

        match outcome {
            Outcome::Latency(ms) => Ok(ProbeSuccess::from_latency(ms)),
            Outcome::Fail(message) => Err(ProbeError::Connection(message.to_string())),
            Outcome::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProbeError::Connection("unreachable".into()))
            }
        }
    }
}

/// A target with tight timeouts suitable for tests. The 100ms latency
/// threshold makes 10ms healthy, 120ms degraded and 200ms unhealthy.
#[allow(dead_code)]
pub fn target(name: &str, priority: PriorityTier) -> TargetConfig {
    TargetConfig {
        name: name.into(),
        kind: TargetKind::Http {
            url: format!("http://{}.test.internal/health", name),
        },
        priority,
        response_time_threshold_ms: 100.0,
        error_rate_threshold_pct: 5.0,
        max_retries: 0,
        check_timeout_ms: 100,
        check_interval_ms: 1_000,
    }
}

#[allow(dead_code)]
pub fn settings(cache_ttl_secs: u64, history_size: usize) -> CollectorConfig {
    CollectorConfig {
        cache_ttl_secs,
        history_size,
    }
}
