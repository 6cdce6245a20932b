//! Repository trait definitions for database operations.
//!
//! Storage is split across focused traits, one per resource family:
//!
//! - [`error`]: Error types for repository operations
//! - [`taxonomy`]: Categories, industries and tools (soft delete, counters)
//! - [`product`]: Product listings and their publication status
//! - [`promocode`]: Discount codes and atomic redemption
//! - [`analytics`]: Ingested analytics events
//!
//! # Convenience Trait Bound
//!
//! Handlers and services that need every capability take [`FullRepository`]:
//!
//! ```ignore
//! async fn publish<R: FullRepository + ?Sized>(repo: &R, id: ProductId) -> RepositoryResult<()> {
//!     let product = repo
//!         .transition_product_status(id, ProductStatus::Draft, ProductStatus::Published)
//!         .await?;
//!     repo.increment_product_count(TaxonomyKind::Category, product.category_id).await?;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod error;
pub mod product;
pub mod promocode;
pub mod taxonomy;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use analytics::EventRepository;
pub use product::ProductRepository;
pub use promocode::PromocodeRepository;
pub use taxonomy::TaxonomyRepository;

/// Composite trait bound for a complete repository implementation.
pub trait FullRepository:
    TaxonomyRepository + ProductRepository + PromocodeRepository + EventRepository
{
}

// Blanket implementation: any type implementing all four traits automatically implements FullRepository
impl<T> FullRepository for T where
    T: TaxonomyRepository + ProductRepository + PromocodeRepository + EventRepository
{
}
