//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the catalog
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the catalog service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream Products API settings.
    pub products_api: ProductsApiConfig,

    /// Credential acquisition for mutating calls.
    pub auth: AuthConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Timeout for a whole inbound request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Which facade implementation serves the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Remote Products API over HTTP.
    #[default]
    Remote,
    /// In-process store seeded with demo data (local development).
    InMemory,
}

/// Upstream Products API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductsApiConfig {
    /// API root, e.g. "https://api.example.com/".
    pub base_url: String,

    /// Per-attempt HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// Deadline for a whole retry sequence in seconds.
    pub total_timeout_secs: u64,

    /// Facade implementation.
    pub backend: BackendKind,

    /// Name of the outbound channel; calls sharing a name share a breaker.
    pub channel: String,
}

impl Default for ProductsApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 5,
            total_timeout_secs: 40,
            backend: BackendKind::Remote,
            channel: "products".to_string(),
        }
    }
}

impl ProductsApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}

/// Where bearer credentials come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// OAuth2 client-credentials exchange against the authority.
    #[default]
    ClientCredentials,
    /// Token negotiated for the current inbound request.
    Session,
}

/// Token exchange configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,

    /// Identity provider authority, e.g. "tenant.auth0.com".
    pub authority: String,

    pub client_id: String,

    pub client_secret: String,

    /// API identifier the token is requested for.
    pub audience: String,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubles per retry.
    pub base_delay_ms: u64,

    /// Statuses treated as transient in addition to 408 and 5xx.
    pub extra_transient_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
            extra_transient_statuses: Vec::new(),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient failures that trip the breaker.
    pub failure_threshold: u32,

    /// How long the breaker stays open, in seconds.
    pub break_duration_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            break_duration_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
