//! Repository trait for product listings.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewProduct, Page, Product, ProductId, ProductQuery, ProductStatus};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Store a validated product as a draft.
    async fn insert_product(&self, product: &NewProduct) -> RepositoryResult<Product>;

    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product>;

    /// Listing filtered by the query, newest first.
    async fn list_products(&self, query: &ProductQuery) -> RepositoryResult<Page<Product>>;

    /// Move a product from `from` to `to` in one step, stamping `published_at`
    /// when publishing.
    ///
    /// Fails with a validation error (field `status`) when the product is not
    /// currently in `from`, so at most one of several racing transitions wins.
    async fn transition_product_status(
        &self,
        id: ProductId,
        from: ProductStatus,
        to: ProductStatus,
    ) -> RepositoryResult<Product>;

    /// Remove the product and return what was removed.
    async fn delete_product(&self, id: ProductId) -> RepositoryResult<Product>;
}
