//! Category, industry and tool administration.
//!
//! The three resources share one set of rules, so every function takes the
//! [`TaxonomyKind`] it operates on.

use log::{debug, info, warn};

use super::validation::{validate_new_taxonomy, validate_taxonomy_update};
use super::ServiceResult;
use crate::db::{ErrorContext, FullRepository, RepositoryError};
use crate::models::{
    ListQuery, NewTaxonomyItem, Page, TaxonomyId, TaxonomyItem, TaxonomyKind, TaxonomyUpdate,
};

fn duplicate(kind: TaxonomyKind, operation: &str) -> RepositoryError {
    RepositoryError::conflict_with_context(
        format!("{} with this name already exists", kind.display_name()),
        ErrorContext::new(operation)
            .with_entity(kind.display_name().to_lowercase())
            .with_field("name"),
    )
}

/// Validate and create an item.
///
/// The duplicate-name lookup runs first so the common case gets a clean 409;
/// the repository still rejects a duplicate that slips in concurrently.
pub async fn create<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    item: &NewTaxonomyItem,
) -> ServiceResult<TaxonomyItem> {
    validate_new_taxonomy(kind, item)?;

    if repo.find_by_name(kind, &item.name).await?.is_some() {
        warn!("Rejected duplicate {} name '{}'", kind, item.name.trim());
        return Err(duplicate(kind, "create").into());
    }

    let created = repo.insert_item(kind, item).await?;
    info!("Created {} {} '{}'", kind, created.id, created.name);
    Ok(created)
}

pub async fn list<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    query: &ListQuery,
) -> ServiceResult<Page<TaxonomyItem>> {
    let params = query.normalized();
    debug!(
        "Listing {} page={} limit={} sort={:?} order={:?}",
        kind.collection(),
        params.page,
        params.limit,
        params.sort,
        params.order
    );
    Ok(repo.list_items(kind, &params).await?)
}

/// Active items sorted by name, for pickers.
pub async fn find_active<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
) -> ServiceResult<Vec<TaxonomyItem>> {
    Ok(repo.find_active(kind).await?)
}

pub async fn get<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    id: TaxonomyId,
) -> ServiceResult<TaxonomyItem> {
    Ok(repo.get_item(kind, id).await?)
}

pub async fn update<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    id: TaxonomyId,
    update: &TaxonomyUpdate,
) -> ServiceResult<TaxonomyItem> {
    validate_taxonomy_update(kind, update)?;

    if let Some(name) = &update.name {
        // 404 takes precedence over 409.
        repo.get_item(kind, id).await?;
        if let Some(existing) = repo.find_by_name(kind, name).await? {
            if existing.id != id {
                return Err(duplicate(kind, "update").into());
            }
        }
    }

    let updated = repo.update_item(kind, id, update).await?;
    info!("Updated {} {}", kind, id);
    Ok(updated)
}

pub async fn toggle_status<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    id: TaxonomyId,
) -> ServiceResult<TaxonomyItem> {
    let item = repo.toggle_status(kind, id).await?;
    info!(
        "{} {} is now {}",
        kind.display_name(),
        id,
        if item.is_active { "active" } else { "inactive" }
    );
    Ok(item)
}

/// Soft delete. Fails while any product still references the item.
pub async fn delete<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    id: TaxonomyId,
) -> ServiceResult<TaxonomyItem> {
    let item = repo.soft_delete(kind, id).await.map_err(|e| {
        if matches!(e, RepositoryError::ValidationError { .. }) {
            warn!("Refused to delete {} {}: {}", kind, id, e.message());
        }
        e
    })?;
    info!("Deleted {} {} '{}'", kind, id, item.name);
    Ok(item)
}

pub async fn increment_product_count<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    id: TaxonomyId,
) -> ServiceResult<TaxonomyItem> {
    Ok(repo.increment_product_count(kind, id).await?)
}

pub async fn decrement_product_count<R: FullRepository + ?Sized>(
    repo: &R,
    kind: TaxonomyKind,
    id: TaxonomyId,
) -> ServiceResult<TaxonomyItem> {
    Ok(repo.decrement_product_count(kind, id).await?)
}
