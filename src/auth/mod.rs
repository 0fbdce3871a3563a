//! Credential acquisition for outbound calls.
//!
//! # Data Flow
//! ```text
//! facade needs a credential
//!     → TokenProvider::token()
//!         → client_credentials.rs (POST {authority}/oauth/token)
//!         → session.rs (token of the request being served)
//!     → Credential attached as `Authorization: Bearer ...`
//! ```
//!
//! # Design Decisions
//! - One trait, strategy chosen at startup
//! - No caching and no retry; a fresh credential per mutating call

pub mod client_credentials;
pub mod session;
pub mod token;

use std::sync::Arc;

pub use client_credentials::ClientCredentialsProvider;
pub use session::{SessionContext, SessionTokenProvider};
pub use token::{AuthError, Credential, TokenProvider};

use crate::config::{AuthConfig, AuthMode};

/// Build the provider selected by `config.mode`.
pub fn build_provider(
    client: reqwest::Client,
    config: &AuthConfig,
) -> Result<Arc<dyn TokenProvider>, AuthError> {
    match config.mode {
        AuthMode::ClientCredentials => {
            Ok(Arc::new(ClientCredentialsProvider::new(client, config)?))
        }
        AuthMode::Session => Ok(Arc::new(SessionTokenProvider)),
    }
}
