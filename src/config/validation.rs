//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (timeouts > 0, buffer cap > 0)
//! - Check addresses parse before any socket is opened
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("not a socket address: {:?}", config.listener.bind_address),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError {
            field: "listener.max_connections",
            message: "must be at least 1".to_string(),
        });
    }

    // Origin addresses are host[:port]; a full socket address always parses.
    if config.upstream.address.is_empty() || config.upstream.address.contains('/') {
        errors.push(ValidationError {
            field: "upstream.address",
            message: format!("not a host[:port] authority: {:?}", config.upstream.address),
        });
    }
    if config.upstream.max_response_bytes == 0 {
        errors.push(ValidationError {
            field: "upstream.max_response_bytes",
            message: "must be at least 1".to_string(),
        });
    }

    if config.admission.domains.iter().all(|d| d.trim().is_empty()) {
        errors.push(ValidationError {
            field: "admission.domains",
            message: "empty domain allow-list rejects every request".to_string(),
        });
    }
    if config.admission.methods.iter().all(|m| m.trim().is_empty()) {
        errors.push(ValidationError {
            field: "admission.methods",
            message: "empty method allow-list rejects every request".to_string(),
        });
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.upstream_secs",
            message: "must be at least 1".to_string(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs",
            message: "must be at least 1".to_string(),
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

    fn valid_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.admission.domains = vec!["example.com".to_string()];
        config
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_empty_domain_list() {
        let config = ProxyConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "admission.domains"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".to_string();
        config.timeouts.upstream_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
