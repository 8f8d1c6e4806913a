//! Configuration loading from disk.

use std::path::Path;

use thiserror::Error;

use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: MonitorConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [collector]
        cache_ttl_secs = 5
        history_size = 50

        [[targets]]
        name = "api"
        type = "http"
        url = "http://127.0.0.1:8080/health"
        priority = "critical"
        response_time_threshold_ms = 150.0

        [[targets]]
        name = "db"
        type = "tcp"
        address = "127.0.0.1:5432"
        priority = "high"
    "#;

    #[test]
    fn loads_sample_config() {
        let path = std::env::temp_dir().join("fleetwatch_loader_test.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap_or_default();

        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.collector.cache_ttl_secs, 5);
        assert_eq!(config.collector.history_size, 50);
        assert_eq!(config.targets[0].response_time_threshold_ms, 150.0);
        // Unset sections fall back to defaults.
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
    }

    #[test]
    fn rejects_invalid_config() {
        let path = std::env::temp_dir().join("fleetwatch_loader_invalid.toml");
        std::fs::write(&path, "targets = []").unwrap();

        let err = load_config(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap_or_default();

        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
