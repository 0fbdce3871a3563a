//! Product catalog facade.
//!
//! # Data Flow
//! ```text
//! presentation layer
//!     → ProductsFacade (facade.rs)
//!         → RemoteProducts (remote.rs): token → policy → Products API
//!         → InMemoryProducts (memory.rs): local ordered store
//!     → Product (model.rs) ⇄ ProductView (view.rs)
//!     → CatalogError (error.rs) on failure
//! ```

pub mod error;
pub mod facade;
pub mod memory;
pub mod model;
pub mod remote;
pub mod view;

use std::sync::Arc;

use thiserror::Error;

pub use error::{CatalogError, CatalogResult};
pub use facade::{ProductsFacade, DELETE_CONFIRMATION};
pub use memory::InMemoryProducts;
pub use model::{Product, ProductInput, StockStatus};
pub use remote::RemoteProducts;
pub use view::ProductView;

use crate::auth::AuthError;
use crate::config::{BackendKind, CatalogConfig};
use crate::resilience::BreakerRegistry;

/// Failure while assembling a facade at startup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid products base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("token provider: {0}")]
    Auth(#[from] AuthError),
}

/// Build the facade selected by `products_api.backend`.
pub fn build_facade(
    config: &CatalogConfig,
    breakers: &BreakerRegistry,
) -> Result<Arc<dyn ProductsFacade>, SetupError> {
    match config.products_api.backend {
        BackendKind::Remote => Ok(Arc::new(RemoteProducts::from_config(config, breakers)?)),
        BackendKind::InMemory => {
            tracing::warn!("Serving the in-memory demo catalog");
            Ok(Arc::new(InMemoryProducts::seeded()))
        }
    }
}
