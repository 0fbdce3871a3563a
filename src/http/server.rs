//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catalog handlers
//! - Wire up middleware (session, request ID, tracing, timeout)
//! - Bind server to listener and stop on shutdown signal
//! - Translate view payloads to facade calls and back

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::catalog::{ProductView, ProductsFacade};
use crate::config::CatalogConfig;
use crate::http::request::session_middleware;
use crate::http::response::{error_body, ApiError};
use crate::resilience::BreakerRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductsFacade>,
    pub breakers: Arc<BreakerRegistry>,
}

/// HTTP server for the catalog.
pub struct HttpServer {
    router: Router,
    config: CatalogConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: CatalogConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &CatalogConfig, state: AppState) -> Router {
        Router::new()
            .route("/products", get(list_products).post(create_product))
            .route("/products/{id}", get(get_product).delete(delete_product))
            .route("/health", get(health))
            .layer(middleware::from_fn(session_middleware))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    )))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = ?self.config.products_api.backend,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>, ApiError> {
    let products = state.products.list_products().await?;
    tracing::debug!(count = products.len(), "Listing products");
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductView>, ApiError> {
    let product = state.products.get_product(id).await?;
    Ok(Json(ProductView::from(product)))
}

async fn create_product(
    State(state): State<AppState>,
    Json(view): Json<ProductView>,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    let created = state.products.create_product(view.into_input()).await?;
    Ok((StatusCode::CREATED, Json(ProductView::from(created))))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    if state.products.delete_product(id).await? {
        tracing::info!(id, "Product deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(error_body(
            StatusCode::NOT_FOUND,
            "not_deleted",
            format!("product {} was not deleted", id),
        ))
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let circuits: BTreeMap<String, &'static str> = state
        .breakers
        .snapshot()
        .into_iter()
        .map(|(name, circuit)| (name, circuit.as_str()))
        .collect();

    Json(json!({ "status": "ok", "circuits": circuits }))
}
