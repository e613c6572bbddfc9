use thiserror::Error;

use crate::db_types::{NewProduct, Product};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// Backend contract for the catalog store.
///
/// The `stock` column is the sole inventory truth source. Backends must implement [`Self::adjust_stock`] so that a
/// decrement which would take stock negative fails without applying, and so that two concurrent decrements against
/// the same product serialize correctly (one of them observes the post-decrement count).
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;

    async fn products_for_seller(&self, seller_id: i64) -> Result<Vec<Product>, CatalogApiError>;

    /// Adjust the stock counter by `delta` (negative to decrement). Returns the product after the adjustment.
    async fn adjust_stock(&self, product_id: i64, delta: i64) -> Result<Product, CatalogApiError>;
}
