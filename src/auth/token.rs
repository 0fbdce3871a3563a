//! Credential type and the provider contract.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// An opaque bearer credential for one outbound call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    /// Token type reported by the issuer, normally "Bearer".
    pub token_type: Option<String>,
    /// Lifetime in seconds reported by the issuer. Informational only.
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

impl Credential {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            expires_in: None,
            scope: None,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

// Keeps tokens out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Errors raised while obtaining a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token endpoint returned status {0}")]
    Exchange(u16),

    #[error("token response did not contain an access_token")]
    MissingAccessToken,

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    #[error("no authenticated session for this request")]
    NoSession,

    #[error("session carries no access token")]
    NoSessionToken,

    #[error("auth not configured: {0}")]
    NotConfigured(String),
}

/// Source of bearer credentials for mutating upstream calls.
///
/// Implementations must not retry; a failed exchange surfaces as [`AuthError`].
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<Credential, AuthError>;
}
