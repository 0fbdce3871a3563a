//! Request-scoped session tokens.
//!
//! The HTTP layer installs a [`SessionContext`] for the duration of each
//! inbound request; [`SessionTokenProvider`] reads it back from inside the
//! facade without the facade knowing about requests.

use std::future::Future;

use async_trait::async_trait;

use crate::auth::token::{AuthError, Credential, TokenProvider};

tokio::task_local! {
    static CURRENT_SESSION: SessionContext;
}

/// What the identity layer established for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    access_token: Option<String>,
}

impl SessionContext {
    /// A session with no token (anonymous user).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    /// Build from an `Authorization` header value; only the Bearer scheme counts.
    pub fn from_authorization(header: Option<&str>) -> Self {
        let token = header.and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            let token = token.trim();
            (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
        });
        Self {
            access_token: token,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Run `fut` with this session as the current one.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT_SESSION.scope(self, fut).await
    }

    /// Session of the request being served, if any.
    pub fn current() -> Option<SessionContext> {
        CURRENT_SESSION.try_with(Clone::clone).ok()
    }
}

/// Hands out the current request's session token.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTokenProvider;

#[async_trait]
impl TokenProvider for SessionTokenProvider {
    async fn token(&self) -> Result<Credential, AuthError> {
        let session = SessionContext::current().ok_or(AuthError::NoSession)?;
        session
            .access_token()
            .map(Credential::bearer)
            .ok_or(AuthError::NoSessionToken)
    }
}
