//! Target probing.
//!
//! # Responsibilities
//! - Define the probe seam (`Prober`) the collector fans out through
//! - Provide the production prober for HTTP and TCP targets
//! - Classify probe failures so the collector can synthesize samples
//!
//! # Design Decisions
//! - Probe failures are values, not panics; the collector contains them
//! - Dispatch on the closed `TargetKind` enum, no string-keyed lookup
//! - The per-attempt timeout is enforced by the collector, uniformly for
//!   every `Prober` implementation

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;

use crate::config::{TargetConfig, TargetKind};

/// A failed probe attempt. Converted to a synthetic unhealthy sample by the
/// collector; never surfaced from a collection batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected status {status}")]
    BadStatus { status: u16 },
}

/// A successful probe observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSuccess {
    pub response_time_ms: f64,
    /// Resource usage, when the probe kind can observe it.
    pub cpu_pct: Option<f64>,
    pub memory_mb: Option<f64>,
}

impl ProbeSuccess {
    pub fn from_latency(response_time_ms: f64) -> Self {
        Self {
            response_time_ms,
            cpu_pct: None,
            memory_mb: None,
        }
    }
}

/// The seam between the collector and the network.
pub trait Prober: Send + Sync {
    fn probe(
        &self,
        target: &TargetConfig,
    ) -> impl Future<Output = Result<ProbeSuccess, ProbeError>> + Send;
}

/// Production prober: HTTP GET or TCP connect depending on target kind.
#[derive(Debug, Clone)]
pub struct NetworkProber {
    client: reqwest::Client,
}

impl NetworkProber {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fleetwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for NetworkProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for NetworkProber {
    async fn probe(&self, target: &TargetConfig) -> Result<ProbeSuccess, ProbeError> {
        let started = Instant::now();
        match &target.kind {
            TargetKind::Http { url } => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ProbeError::Connection(e.to_string()))?;

                let elapsed = elapsed_ms(started);
                if response.status().is_success() {
                    Ok(ProbeSuccess::from_latency(elapsed))
                } else {
                    Err(ProbeError::BadStatus {
                        status: response.status().as_u16(),
                    })
                }
            }
            TargetKind::Tcp { address } => {
                tokio::net::TcpStream::connect(address.as_str())
                    .await
                    .map_err(|e| ProbeError::Connection(e.to_string()))?;
                Ok(ProbeSuccess::from_latency(elapsed_ms(started)))
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    let ms = started.elapsed().as_secs_f64() * 1000.0;
    (ms * 100.0).round() / 100.0
}

const RETRY_BASE_MS: u64 = 100;
const RETRY_MAX_MS: u64 = 2_000;

/// Exponential backoff delay with jitter between probe retry attempts.
/// Attempt 0 is the initial try and carries no delay.
pub(crate) fn retry_delay(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped = RETRY_BASE_MS.saturating_mul(exponential).min(RETRY_MAX_MS);

    // Up to 10% jitter so synchronized retries spread out.
    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
