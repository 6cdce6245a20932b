//! Repository trait for taxonomy items (categories, industries, tools).
//!
//! Every method is scoped by [`TaxonomyKind`]; the three collections never see
//! each other's names or ids. Soft-deleted items behave as absent for every
//! read and for name uniqueness.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    ListParams, NewTaxonomyItem, Page, TaxonomyId, TaxonomyItem, TaxonomyKind, TaxonomyUpdate,
};

#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    /// Check if the storage backend is healthy.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert a validated item.
    ///
    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If a visible item of the same kind
    ///   already has this name, compared case-insensitively
    async fn insert_item(
        &self,
        kind: TaxonomyKind,
        item: &NewTaxonomyItem,
    ) -> RepositoryResult<TaxonomyItem>;

    /// Fetch one visible item.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If missing or soft-deleted
    async fn get_item(&self, kind: TaxonomyKind, id: TaxonomyId) -> RepositoryResult<TaxonomyItem>;

    /// Case-insensitive lookup among visible items.
    async fn find_by_name(
        &self,
        kind: TaxonomyKind,
        name: &str,
    ) -> RepositoryResult<Option<TaxonomyItem>>;

    /// Filtered, sorted and paginated listing of visible items.
    async fn list_items(
        &self,
        kind: TaxonomyKind,
        params: &ListParams,
    ) -> RepositoryResult<Page<TaxonomyItem>>;

    /// All active, visible items sorted by name.
    async fn find_active(&self, kind: TaxonomyKind) -> RepositoryResult<Vec<TaxonomyItem>>;

    /// Apply a validated partial update.
    ///
    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If the new name collides with another item
    async fn update_item(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
        update: &TaxonomyUpdate,
    ) -> RepositoryResult<TaxonomyItem>;

    /// Flip `is_active`.
    async fn toggle_status(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
    ) -> RepositoryResult<TaxonomyItem>;

    /// Mark deleted and inactive.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If `product_count > 0`
    async fn soft_delete(&self, kind: TaxonomyKind, id: TaxonomyId)
        -> RepositoryResult<TaxonomyItem>;

    async fn increment_product_count(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
    ) -> RepositoryResult<TaxonomyItem>;

    /// Decrement, saturating at zero.
    async fn decrement_product_count(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
    ) -> RepositoryResult<TaxonomyItem>;
}
