//! Catalog error taxonomy.

use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthError;
use crate::resilience::PolicyError;

/// Errors surfaced by a products facade.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Bad caller input; never retried.
    #[error("invalid input: {0}")]
    Validation(String),

    /// No credential could be obtained for a mutating call.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Upstream answered 404 for a single product.
    #[error("product {0} not found")]
    NotFound(i64),

    /// Non-success status, malformed body, or transient failures that
    /// outlasted every retry.
    #[error("upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// Circuit breaker is open; no call was attempted.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The retry sequence ran past its deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),
}

impl CatalogError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        CatalogError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "validation",
            CatalogError::Auth(_) => "auth",
            CatalogError::NotFound(_) => "not_found",
            CatalogError::Upstream { .. } => "upstream",
            CatalogError::Unavailable(_) => "unavailable",
            CatalogError::Timeout(_) => "timeout",
        }
    }
}

impl From<PolicyError> for CatalogError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::CircuitOpen { .. } => CatalogError::Unavailable(err.to_string()),
            PolicyError::TimedOut(deadline) => CatalogError::Timeout(deadline),
        }
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
