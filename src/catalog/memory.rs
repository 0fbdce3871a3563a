//! In-process products facade for local development and tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::facade::{validate_id, ProductsFacade};
use crate::catalog::model::{Product, ProductInput, StockStatus};

#[derive(Debug, Default)]
struct Store {
    products: BTreeMap<i64, Product>,
    last_id: i64,
}

/// Ordered, lock-protected product store honouring the facade contract.
#[derive(Debug, Default)]
pub struct InMemoryProducts {
    store: RwLock<Store>,
}

impl InMemoryProducts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with a few demo products.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let demo = [
            ("Laptop", "High-performance laptop", Decimal::new(120000, 2), 15),
            ("Smartphone", "Latest model smartphone", Decimal::new(80000, 2), 40),
            ("Tablet", "Portable and powerful tablet", Decimal::new(60000, 2), 0),
        ];

        let store = Self::new();
        for (name, description, price, stock_level) in demo {
            store.insert(ProductInput {
                name: name.to_string(),
                description: description.to_string(),
                price,
                stock_status: if stock_level > 0 {
                    StockStatus::InStock
                } else {
                    StockStatus::OutOfStock
                },
                stock_level,
                last_updated: now,
                category_id: 1,
            });
        }
        store
    }

    pub fn len(&self) -> usize {
        self.read().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, input: ProductInput) -> Product {
        let mut store = self.store.write().expect("product store lock poisoned");
        store.last_id += 1;
        let product = input.into_product(store.last_id);
        store.products.insert(product.id, product.clone());
        product
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        self.store.read().expect("product store lock poisoned")
    }
}

#[async_trait]
impl ProductsFacade for InMemoryProducts {
    async fn list_products(&self) -> CatalogResult<Vec<Product>> {
        Ok(self.read().products.values().cloned().collect())
    }

    async fn get_product(&self, id: i64) -> CatalogResult<Product> {
        validate_id(id)?;
        self.read()
            .products
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    async fn create_product(&self, input: ProductInput) -> CatalogResult<Product> {
        input.validate()?;
        let product = self.insert(input);
        tracing::debug!(id = product.id, "Product stored in memory");
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> CatalogResult<bool> {
        validate_id(id)?;
        let mut store = self.store.write().expect("product store lock poisoned");
        Ok(store.products.remove(&id).is_some())
    }
}
