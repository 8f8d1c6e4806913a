//! TTL cache for collected samples.
//!
//! A cache hit returns the stored sample without touching the network; the
//! entry expires `ttl` after the probe that produced it. Entries are written
//! only by the owning target's collection task, so no cross-target locking
//! is needed beyond the map itself.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::collector::sample::MetricSample;

#[derive(Debug, Clone)]
struct CacheEntry {
    sample: MetricSample,
    captured_at: Instant,
}

/// Thread-safe per-target sample cache with a fixed TTL.
#[derive(Debug)]
pub struct SampleCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

/// Point-in-time cache statistics for observability.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub ttl_secs: u64,
}

impl SampleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached sample for a target if it is still fresh.
    pub fn get_fresh(&self, target: &str) -> Option<MetricSample> {
        let entry = self.entries.get(target)?;
        if entry.captured_at.elapsed() < self.ttl {
            Some(entry.sample.clone())
        } else {
            None
        }
    }

    /// Store a freshly probed sample.
    pub fn insert(&self, sample: MetricSample) {
        self.entries.insert(
            sample.target.clone(),
            CacheEntry {
                sample,
                captured_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ttl_secs: self.ttl.as_secs(),
        }
    }
}
