//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → shared via Arc to collector, processor and breaker manager
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; target definitions never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AlertThresholds, CircuitBreakerConfig, CollectorConfig, MonitorConfig, ObservabilityConfig,
    PriorityTier, TargetConfig, TargetKind,
};
