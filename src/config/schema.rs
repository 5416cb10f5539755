//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Remote chat backend the gateway proxies to.
    pub upstream: UpstreamConfig,

    /// Retry policy for the upstream chat backend.
    pub retries: RetryConfig,

    /// Identity/subscription provider settings.
    pub provider: ProviderConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Cap on requests served concurrently; excess callers wait for a slot.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Remote chat backend configuration.
///
/// The backend runs on a free-tier host that suspends idle instances, so the
/// retry policy below is tuned around waking it up.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the chat backend (no trailing slash).
    pub base_url: String,

    /// Path of the chat endpoint on the backend.
    pub chat_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            chat_path: "/chat".to_string(),
        }
    }
}

/// Retry configuration for upstream requests.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first failure.
    pub max_retries: u32,

    /// Deadline for the first attempt in milliseconds.
    /// Long, to absorb a cold-start wake-up.
    pub cold_start_timeout_ms: u64,

    /// Deadline for retry attempts in milliseconds.
    /// Shorter; the first attempt already woke the backend.
    pub warm_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            cold_start_timeout_ms: 30_000,
            warm_timeout_ms: 10_000,
        }
    }
}

/// Identity/subscription provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider project.
    pub base_url: String,

    /// Anonymous API key sent with every provider request.
    pub anon_key: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Emails granted unconditional premium access, independent of billing.
    pub developer_emails: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            timeout_secs: 10,
            developer_emails: crate::access::DEVELOPER_EMAILS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    /// Must exceed the upstream retry sequence or the gateway gives up
    /// before a cold backend finishes waking.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 75 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add hardening response headers.
    pub enable_headers: bool,

    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cold_start_tuning() {
        let config = GatewayConfig::default();
        assert_eq!(config.retries.max_retries, 2);
        assert_eq!(config.retries.cold_start_timeout_ms, 30_000);
        assert_eq!(config.retries.warm_timeout_ms, 10_000);
        assert!(config.timeouts.request_secs * 1000 > config.retries.cold_start_timeout_ms);
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "https://delta-80ht.onrender.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.base_url, "https://delta-80ht.onrender.com");
        assert_eq!(config.upstream.chat_path, "/chat");
        assert_eq!(config.retries.max_retries, 2);
        assert!(!config.provider.developer_emails.is_empty());
    }
}
