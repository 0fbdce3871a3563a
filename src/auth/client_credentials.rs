//! OAuth2 client-credentials token exchange.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::auth::token::{AuthError, Credential, TokenProvider};
use crate::config::AuthConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    token_type: Option<String>,
    scope: Option<String>,
}

/// Exchanges client id/secret for a token on every call.
pub struct ClientCredentialsProvider {
    client: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    audience: String,
}

impl ClientCredentialsProvider {
    pub fn new(client: reqwest::Client, config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            client,
            token_url: token_endpoint(&config.authority)?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            audience: config.audience.clone(),
        })
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

/// `{authority}/oauth/token`; a bare host is taken to be https.
pub fn token_endpoint(authority: &str) -> Result<Url, AuthError> {
    let authority = authority.trim().trim_end_matches('/');
    if authority.is_empty() {
        return Err(AuthError::NotConfigured("authority is empty".into()));
    }

    let base = if authority.contains("://") {
        authority.to_string()
    } else {
        format!("https://{}", authority)
    };

    Url::parse(&format!("{}/oauth/token", base))
        .map_err(|e| AuthError::NotConfigured(format!("invalid authority '{}': {}", authority, e)))
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn token(&self) -> Result<Credential, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("audience", self.audience.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, url = %self.token_url, "Token exchange rejected");
            return Err(AuthError::Exchange(status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let access_token = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        tracing::debug!(expires_in = ?body.expires_in, "Obtained client-credentials token");

        let mut credential = Credential::bearer(access_token);
        credential.token_type = body.token_type;
        credential.expires_in = body.expires_in;
        credential.scope = body.scope;
        Ok(credential)
    }
}
