//! Fleetwatch: health-metrics collection and scoring for a fleet of remote
//! dependencies.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────┐
//!                  │                  FLEETWATCH                     │
//!                  │                                                 │
//!   snapshot()     │  ┌───────────┐   probes    ┌─────────────────┐ │
//!   ───────────────┼─▶│ collector │────────────▶│ targets (HTTP/  │ │
//!                  │  │ fan-out + │◀────────────│ TCP endpoints)  │ │
//!                  │  │ cache +   │   samples   └─────────────────┘ │
//!                  │  │ history   │                                 │
//!                  │  └─────┬─────┘        ┌──────────────────────┐ │
//!                  │        │ samples      │      resilience      │ │
//!                  │        ▼              │  circuit breakers    │ │
//!                  │  ┌───────────┐        │  gating external     │ │
//!   report         │  │ processor │        │  dependency calls    │ │
//!   ◀──────────────┼──│ score +   │        └──────────────────────┘ │
//!                  │  │ alerts    │                                 │
//!                  │  └───────────┘   config / observability        │
//!                  └────────────────────────────────────────────────┘
//! ```
//!
//! Per-target failures never escape the collector: a probe error becomes a
//! synthetic unhealthy sample, and the processor turns whatever arrived into
//! a report with a data-quality score saying how much to trust it.

// Core pipeline
pub mod collector;
pub mod processor;

// Cross-cutting concerns
pub mod config;
pub mod context;
pub mod observability;
pub mod resilience;

pub use collector::{MetricSample, MetricsCollector, TargetStatus};
pub use config::MonitorConfig;
pub use context::MonitorContext;
pub use processor::{MetricsProcessor, ProcessedReport};
pub use resilience::{CircuitBreakerManager, CircuitError, CircuitState};
