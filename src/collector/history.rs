//! Bounded per-target sample history and rolling statistics.
//!
//! # Design Decisions
//! - FIFO ring per target; oldest entry evicted on overflow, no other policy
//! - Error rate is computed over a short recent window, uptime over the full ring
//! - Each target's ring is written only by that target's collection task

use std::collections::VecDeque;

use dashmap::DashMap;

use crate::collector::sample::MetricSample;

/// Window used for the rolling error rate.
const ERROR_RATE_WINDOW: usize = 50;

/// Rolling statistics derived from a target's history, taken before the
/// current sample is appended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    pub error_rate_pct: f64,
    pub uptime_pct: f64,
    /// Trailing run of non-healthy samples.
    pub failure_streak: u32,
}

/// Bounded sample history for all targets.
#[derive(Debug)]
pub struct HistoryStore {
    rings: DashMap<String, VecDeque<MetricSample>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            rings: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, evicting the oldest entry when the ring is full.
    pub fn push(&self, sample: MetricSample) {
        let mut ring = self
            .rings
            .entry(sample.target.clone())
            .or_insert_with(VecDeque::new);
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(sample);
    }

    /// Rolling statistics for a target given the outcome of the probe that
    /// is about to be recorded. With no history yet, the current outcome
    /// alone decides the rates.
    pub fn rolling_stats(&self, target: &str, current_healthy: bool) -> RollingStats {
        let ring = match self.rings.get(target) {
            Some(r) if !r.is_empty() => r,
            _ => {
                return RollingStats {
                    error_rate_pct: if current_healthy { 0.0 } else { 100.0 },
                    uptime_pct: if current_healthy { 100.0 } else { 0.0 },
                    failure_streak: 0,
                }
            }
        };

        let recent = ring.len().min(ERROR_RATE_WINDOW);
        let errors = ring
            .iter()
            .rev()
            .take(recent)
            .filter(|s| !s.status.is_healthy())
            .count();
        let error_rate_pct = round2(errors as f64 / recent as f64 * 100.0);

        let healthy = ring.iter().filter(|s| s.status.is_healthy()).count();
        let uptime_pct = round2(healthy as f64 / ring.len() as f64 * 100.0);

        let failure_streak = ring
            .iter()
            .rev()
            .take_while(|s| !s.status.is_healthy())
            .count() as u32;

        RollingStats {
            error_rate_pct,
            uptime_pct,
            failure_streak,
        }
    }

    /// Most recent `limit` samples for a target, oldest first.
    pub fn recent(&self, target: &str, limit: usize) -> Vec<MetricSample> {
        match self.rings.get(target) {
            Some(ring) => {
                let skip = ring.len().saturating_sub(limit);
                ring.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    pub fn len(&self, target: &str) -> usize {
        self.rings.get(target).map_or(0, |r| r.len())
    }

    /// Total entries across all targets.
    pub fn total_entries(&self) -> usize {
        self.rings.iter().map(|r| r.len()).sum()
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
