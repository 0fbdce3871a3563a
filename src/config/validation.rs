//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts, thresholds)
//! - Check that the selected backend and auth mode have what they need
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CatalogConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{AuthMode, BackendKind, CatalogConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &CatalogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let api = &config.products_api;

    if api.backend == BackendKind::Remote {
        if api.base_url.trim().is_empty() {
            errors.push(ValidationError::new(
                "products_api.base_url",
                "required when backend is remote",
            ));
        } else if let Err(e) = url::Url::parse(&api.base_url) {
            errors.push(ValidationError::new(
                "products_api.base_url",
                format!("invalid URL '{}': {}", api.base_url, e),
            ));
        }
    }

    if api.timeout_secs == 0 {
        errors.push(ValidationError::new("products_api.timeout_secs", "must be > 0"));
    }

    if !(5..=120).contains(&api.total_timeout_secs) {
        errors.push(ValidationError::new(
            "products_api.total_timeout_secs",
            "must be between 5 and 120",
        ));
    } else if api.timeout_secs > api.total_timeout_secs {
        errors.push(ValidationError::new(
            "products_api.timeout_secs",
            "must not exceed total_timeout_secs",
        ));
    }

    // Inbound timeout must outlast the facade deadline.
    if config.listener.request_timeout_secs <= api.total_timeout_secs {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            format!(
                "must exceed products_api.total_timeout_secs ({})",
                api.total_timeout_secs
            ),
        ));
    }

    if api.channel.trim().is_empty() {
        errors.push(ValidationError::new("products_api.channel", "must not be empty"));
    }

    if api.backend == BackendKind::Remote && config.auth.mode == AuthMode::ClientCredentials {
        let auth = &config.auth;
        let required = [
            ("auth.authority", &auth.authority),
            ("auth.client_id", &auth.client_id),
            ("auth.client_secret", &auth.client_secret),
            ("auth.audience", &auth.audience),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(
                    field,
                    "required for client_credentials mode",
                ));
            }
        }
    }

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_threshold",
            "must be > 0",
        ));
    }

    if config.circuit_breaker.break_duration_secs == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.break_duration_secs",
            "must be > 0",
        ));
    }

    for status in &config.retries.extra_transient_statuses {
        if !(100..=599).contains(status) {
            errors.push(ValidationError::new(
                "retries.extra_transient_statuses",
                format!("{} is not an HTTP status", status),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
