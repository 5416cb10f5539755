//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check endpoint URLs before any client is built from them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{value}' for {field}")]
    BindAddress { field: &'static str, value: String },

    #[error("invalid URL '{value}' for {field}: {reason}")]
    Endpoint {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
}

/// Validate a loaded configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BindAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    check_http_url(&mut errors, "upstream.base_url", &config.upstream.base_url);
    check_http_url(&mut errors, "provider.base_url", &config.provider.base_url);

    if config.retries.cold_start_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "retries.cold_start_timeout_ms",
        });
    }
    if config.retries.warm_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "retries.warm_timeout_ms",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "timeouts.request_secs",
        });
    }
    if config.provider.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "provider.timeout_secs",
        });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "security.max_body_size",
        });
    }
    // A zero cap would park every request on the concurrency semaphore.
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "listener.max_connections",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match value.parse::<Url>() {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::Endpoint {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::Endpoint {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.base_url = "ftp://delta".into();
        config.retries.warm_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_zero_concurrency_cap() {
        let mut config = GatewayConfig::default();
        config.listener.max_connections = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("listener.max_connections")));
    }

    #[test]
    fn rejects_unparseable_url() {
        let mut config = GatewayConfig::default();
        config.provider.base_url = "http://".into();
        assert!(validate_config(&config).is_err());
    }
}
