//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an external dependency:
//!     → manager.rs (look up or create the named breaker)
//!     → circuit_breaker.rs (gate the call, record the outcome)
//!     → Open/HalfOpenExhausted fail fast; Inner re-raises the real error
//! ```
//!
//! # Design Decisions
//! - Per-dependency breakers, never a global one
//! - Fail fast in Open state; bounded trial calls in Half-Open
//! - Gating state is pull-inspected via `stats()`, no callbacks

pub mod circuit_breaker;
pub mod manager;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerStats, CircuitError, CircuitState};
pub use manager::{BreakerHealthSummary, CircuitBreakerManager, FleetState};
