//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones: unique target names,
//! parseable endpoints, sane threshold ordering. Validation is a pure
//! function and returns every error found, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::{MonitorConfig, TargetKind};

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `targets[2].url`.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.targets.is_empty() {
        errors.push(ValidationError {
            field: "targets".into(),
            message: "at least one target must be configured".into(),
        });
    }

    let mut seen = HashSet::new();
    for (i, target) in config.targets.iter().enumerate() {
        let at = |field: &str| format!("targets[{}].{}", i, field);

        if target.name.trim().is_empty() {
            errors.push(ValidationError {
                field: at("name"),
                message: "target name must not be empty".into(),
            });
        } else if !seen.insert(target.name.clone()) {
            errors.push(ValidationError {
                field: at("name"),
                message: format!("duplicate target name '{}'", target.name),
            });
        }

        match &target.kind {
            TargetKind::Http { url } => {
                if let Err(e) = url::Url::parse(url) {
                    errors.push(ValidationError {
                        field: at("url"),
                        message: format!("invalid URL '{}': {}", url, e),
                    });
                }
            }
            TargetKind::Tcp { address } => {
                if address.parse::<SocketAddr>().is_err() {
                    errors.push(ValidationError {
                        field: at("address"),
                        message: format!("invalid socket address '{}'", address),
                    });
                }
            }
        }

        if target.check_timeout_ms == 0 {
            errors.push(ValidationError {
                field: at("check_timeout_ms"),
                message: "probe timeout must be greater than zero".into(),
            });
        }
        if target.response_time_threshold_ms <= 0.0 {
            errors.push(ValidationError {
                field: at("response_time_threshold_ms"),
                message: "response time threshold must be positive".into(),
            });
        }
    }

    if config.collector.history_size == 0 {
        errors.push(ValidationError {
            field: "collector.history_size".into(),
            message: "history size must be at least 1".into(),
        });
    }

    let t = &config.thresholds;
    if t.response_time_warning_ms >= t.response_time_critical_ms {
        errors.push(ValidationError {
            field: "thresholds.response_time_warning_ms".into(),
            message: "warning threshold must be below critical".into(),
        });
    }
    if t.error_rate_warning_pct >= t.error_rate_critical_pct {
        errors.push(ValidationError {
            field: "thresholds.error_rate_warning_pct".into(),
            message: "warning threshold must be below critical".into(),
        });
    }
    if t.availability_warning_pct <= t.availability_critical_pct {
        errors.push(ValidationError {
            field: "thresholds.availability_warning_pct".into(),
            message: "warning threshold must be above critical".into(),
        });
    }
    if t.consecutive_failures_warning >= t.consecutive_failures_critical {
        errors.push(ValidationError {
            field: "thresholds.consecutive_failures_warning".into(),
            message: "warning threshold must be below critical".into(),
        });
    }

    let cb = &config.circuit_breaker;
    if cb.failure_threshold == 0 {
        errors.push(ValidationError {
            field: "circuit_breaker.failure_threshold".into(),
            message: "failure threshold must be at least 1".into(),
        });
    }
    if cb.half_open_max_calls == 0 {
        errors.push(ValidationError {
            field: "circuit_breaker.half_open_max_calls".into(),
            message: "half-open call budget must be at least 1".into(),
        });
    }
    if cb.success_threshold == 0 {
        errors.push(ValidationError {
            field: "circuit_breaker.success_threshold".into(),
            message: "success threshold must be at least 1".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TargetConfig;

    fn http_target(name: &str, url: &str) -> TargetConfig {
        TargetConfig {
            name: name.into(),
            kind: TargetKind::Http { url: url.into() },
            priority: Default::default(),
            response_time_threshold_ms: 300.0,
            error_rate_threshold_pct: 5.0,
            max_retries: 2,
            check_timeout_ms: 5_000,
            check_interval_ms: 15_000,
        }
    }

    #[test]
    fn accepts_valid_config() {
        let config = MonitorConfig {
            targets: vec![http_target("api", "http://127.0.0.1:8080/health")],
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_empty_target_list() {
        let config = MonitorConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "targets"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = MonitorConfig {
            targets: vec![
                http_target("api", "not a url"),
                http_target("api", "http://localhost/health"),
            ],
            ..Default::default()
        };
        config.targets[1].check_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "targets[0].url"));
        assert!(errors.iter().any(|e| e.field == "targets[1].name"));
        assert!(errors.iter().any(|e| e.field == "targets[1].check_timeout_ms"));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = MonitorConfig {
            targets: vec![http_target("api", "http://localhost/health")],
            ..Default::default()
        };
        config.thresholds.response_time_warning_ms = 800.0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "thresholds.response_time_warning_ms"));
    }
}
