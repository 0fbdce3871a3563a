//! The typed contract the presentation layer programs against.

use async_trait::async_trait;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::model::{Product, ProductInput};

/// Text the upstream includes in the body of a successful delete.
pub const DELETE_CONFIRMATION: &str = "has been deleted";

/// List/get/create/delete over the product resource.
#[async_trait]
pub trait ProductsFacade: Send + Sync {
    /// Every product, as upstream returned them.
    async fn list_products(&self) -> CatalogResult<Vec<Product>>;

    /// One product; `NotFound` when upstream does not know the id.
    async fn get_product(&self, id: i64) -> CatalogResult<Product>;

    /// Create a product and return it with its assigned id.
    async fn create_product(&self, input: ProductInput) -> CatalogResult<Product>;

    /// `true` only when upstream confirmed the deletion. A refused delete
    /// is `Ok(false)`, not an error.
    async fn delete_product(&self, id: i64) -> CatalogResult<bool>;
}

/// Ids are positive; anything else is rejected before any I/O.
pub fn validate_id(id: i64) -> CatalogResult<()> {
    if id <= 0 {
        return Err(CatalogError::Validation(format!(
            "product id must be positive, got {}",
            id
        )));
    }
    Ok(())
}
