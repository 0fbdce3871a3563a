//! Products facade over the remote Products API.
//!
//! # Responsibilities
//! - Build requests against `{base_url}products[/{id}]`
//! - Attach a fresh bearer credential to create and delete
//! - Run every request through the channel's resilience policy
//! - Map statuses and bodies to typed results
//!
//! # Design Decisions
//! - Reads are anonymous
//! - Credentials are fetched per call, never cached here
//! - One policy (and so one breaker) per facade instance

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, StatusCode};
use url::Url;

use crate::auth::{self, TokenProvider};
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::facade::{validate_id, ProductsFacade, DELETE_CONFIRMATION};
use crate::catalog::model::{Product, ProductInput};
use crate::catalog::SetupError;
use crate::config::CatalogConfig;
use crate::observability::metrics;
use crate::resilience::{BreakerRegistry, ResiliencePolicy, RetryPolicy};

/// HTTP implementation of [`ProductsFacade`].
#[derive(Clone)]
pub struct RemoteProducts {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
    policy: ResiliencePolicy,
}

impl RemoteProducts {
    pub fn new(
        client: reqwest::Client,
        base_url: Url,
        tokens: Arc<dyn TokenProvider>,
        policy: ResiliencePolicy,
    ) -> Self {
        Self {
            client,
            base_url: with_trailing_slash(base_url),
            tokens,
            policy,
        }
    }

    /// Wire up client, token provider and policy from configuration.
    pub fn from_config(
        config: &CatalogConfig,
        breakers: &BreakerRegistry,
    ) -> Result<Self, SetupError> {
        let api = &config.products_api;
        let base_url = Url::parse(&api.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(api.timeout())
            .default_headers(headers)
            .user_agent(concat!("product-catalog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tokens = auth::build_provider(client.clone(), &config.auth)?;
        let policy = ResiliencePolicy::new(
            RetryPolicy::from_config(&config.retries),
            breakers.channel(&api.channel),
            api.total_timeout(),
        );

        tracing::info!(
            base_url = %base_url,
            channel = %api.channel,
            auth_mode = ?config.auth.mode,
            "Remote products facade configured"
        );

        Ok(Self::new(client, base_url, tokens, policy))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }

    fn url(&self, path: &str) -> CatalogResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CatalogError::Validation(format!("bad resource path '{}': {}", path, e)))
    }

    /// Send through the resilience policy. Each attempt reads the whole
    /// body, so a connection lost mid-body is a transport failure of that
    /// attempt. Failures that survive the retries become `Upstream`; any
    /// HTTP status is returned as-is.
    async fn send<F>(&self, operation: &'static str, build: F) -> CatalogResult<Reply>
    where
        F: Fn() -> RequestBuilder,
    {
        let start = Instant::now();
        let retry = self.policy.retry();

        let outcome = self
            .policy
            .execute(
                operation,
                || Reply::fetch(build()),
                |o: &Result<Reply, reqwest::Error>| {
                    retry.classify_outcome(o.as_ref().map(|reply| reply.status))
                },
            )
            .await;

        match outcome {
            Ok(Ok(reply)) => {
                metrics::record_upstream_request(operation, reply.status.as_str(), start);
                tracing::debug!(operation, status = %reply.status, "Upstream responded");
                Ok(reply)
            }
            Ok(Err(e)) => {
                metrics::record_upstream_request(operation, "transport_error", start);
                tracing::error!(operation, error = %e, "Upstream request failed");
                Err(CatalogError::upstream(
                    None,
                    format!("{} failed: {}", operation, e),
                ))
            }
            Err(policy_err) => {
                let err = CatalogError::from(policy_err);
                metrics::record_upstream_request(operation, err.kind(), start);
                Err(err)
            }
        }
    }
}

/// Status and fully read body of one upstream response.
#[derive(Debug)]
struct Reply {
    status: StatusCode,
    body: Vec<u8>,
}

impl Reply {
    async fn fetch(request: RequestBuilder) -> Result<Self, reqwest::Error> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(Self { status, body })
    }

    fn json<T: serde::de::DeserializeOwned>(&self, operation: &str) -> CatalogResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::warn!(operation, error = %e, "Malformed upstream body");
            CatalogError::upstream(
                Some(self.status.as_u16()),
                format!("{} returned a malformed body: {}", operation, e),
            )
        })
    }

    fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn unexpected_status(operation: &str, status: StatusCode) -> CatalogError {
    CatalogError::upstream(
        Some(status.as_u16()),
        format!("{} returned {}", operation, status),
    )
}

#[async_trait]
impl ProductsFacade for RemoteProducts {
    async fn list_products(&self) -> CatalogResult<Vec<Product>> {
        let url = self.url("products")?;
        let reply = self
            .send("list_products", || self.client.get(url.clone()))
            .await?;

        if !reply.status.is_success() {
            return Err(unexpected_status("list_products", reply.status));
        }
        reply.json("list_products")
    }

    async fn get_product(&self, id: i64) -> CatalogResult<Product> {
        validate_id(id)?;
        let url = self.url(&format!("products/{}", id))?;
        let reply = self
            .send("get_product", || self.client.get(url.clone()))
            .await?;

        match reply.status {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(id)),
            status if status.is_success() => reply.json("get_product"),
            status => Err(unexpected_status("get_product", status)),
        }
    }

    async fn create_product(&self, input: ProductInput) -> CatalogResult<Product> {
        input.validate()?;
        let credential = self.tokens.token().await?;
        let url = self.url("products")?;

        let reply = self
            .send("create_product", || {
                self.client
                    .post(url.clone())
                    .bearer_auth(credential.access_token())
                    .json(&input)
            })
            .await?;

        if !reply.status.is_success() {
            return Err(unexpected_status("create_product", reply.status));
        }

        let created: Product = reply.json("create_product")?;
        tracing::info!(id = created.id, name = %created.name, "Product created");
        Ok(created)
    }

    async fn delete_product(&self, id: i64) -> CatalogResult<bool> {
        validate_id(id)?;
        let credential = self.tokens.token().await?;
        let url = self.url(&format!("products/{}", id))?;

        let reply = self
            .send("delete_product", || {
                self.client
                    .delete(url.clone())
                    .bearer_auth(credential.access_token())
            })
            .await?;

        if !reply.status.is_success() {
            tracing::info!(id, status = %reply.status, "Delete refused by upstream");
            return Ok(false);
        }

        let confirmed = reply.text().contains(DELETE_CONFIRMATION);
        if !confirmed {
            tracing::warn!(id, "Delete succeeded without confirmation text");
        }
        Ok(confirmed)
    }
}
