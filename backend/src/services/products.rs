//! Product listings and the taxonomy counters they drive.
//!
//! Only published products count towards `productCount`. Publishing bumps the
//! counter on the product's category, industry and each distinct tool;
//! unpublishing and deleting a published product reverse it.

use log::{info, warn};

use super::validation::validate_new_product;
use super::{ServiceError, ServiceResult};
use crate::db::{FullRepository, RepositoryError};
use crate::models::{
    NewProduct, Page, Product, ProductId, ProductQuery, ProductStatus, TaxonomyId, TaxonomyKind,
};

fn field_for(kind: TaxonomyKind) -> &'static str {
    match kind {
        TaxonomyKind::Category => "categoryId",
        TaxonomyKind::Industry => "industryId",
        TaxonomyKind::Tool => "toolIds",
    }
}

/// Every referenced taxonomy item must exist and be active.
async fn check_references<R: FullRepository + ?Sized>(
    repo: &R,
    refs: &[(TaxonomyKind, TaxonomyId)],
) -> ServiceResult<()> {
    for &(kind, id) in refs {
        let item = match repo.get_item(kind, id).await {
            Ok(item) => item,
            Err(RepositoryError::NotFound { .. }) => {
                return Err(ServiceError::field(
                    field_for(kind),
                    format!("{} {} does not exist", kind.display_name(), id),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        if !item.is_active {
            return Err(ServiceError::field(
                field_for(kind),
                format!("{} '{}' is inactive", kind.display_name(), item.name),
            ));
        }
    }
    Ok(())
}

pub async fn create<R: FullRepository + ?Sized>(
    repo: &R,
    product: &NewProduct,
) -> ServiceResult<Product> {
    validate_new_product(product)?;
    check_references(repo, &product.taxonomy_refs()).await?;

    let created = repo.insert_product(product).await?;
    info!("Created product {} '{}' as draft", created.id, created.title);
    Ok(created)
}

pub async fn list<R: FullRepository + ?Sized>(
    repo: &R,
    query: &ProductQuery,
) -> ServiceResult<Page<Product>> {
    Ok(repo.list_products(query).await?)
}

pub async fn get<R: FullRepository + ?Sized>(repo: &R, id: ProductId) -> ServiceResult<Product> {
    Ok(repo.get_product(id).await?)
}

/// Status change that loses to a concurrent one surfaces as `message`.
async fn transition<R: FullRepository + ?Sized>(
    repo: &R,
    id: ProductId,
    from: ProductStatus,
    to: ProductStatus,
    message: &str,
) -> ServiceResult<Product> {
    match repo.transition_product_status(id, from, to).await {
        Ok(product) => Ok(product),
        Err(RepositoryError::ValidationError { .. }) => Err(ServiceError::field("status", message)),
        Err(e) => Err(e.into()),
    }
}

/// Move a draft to published and count it against its taxonomy.
///
/// Counters move only for the caller whose status transition succeeds.
pub async fn publish<R: FullRepository + ?Sized>(repo: &R, id: ProductId) -> ServiceResult<Product> {
    const ALREADY: &str = "Product is already published";
    let product = repo.get_product(id).await?;
    if product.is_published() {
        return Err(ServiceError::field("status", ALREADY));
    }
    let refs = product.taxonomy_refs();
    check_references(repo, &refs).await?;

    let published = transition(repo, id, ProductStatus::Draft, ProductStatus::Published, ALREADY).await?;
    for (kind, item_id) in refs {
        repo.increment_product_count(kind, item_id).await?;
    }
    info!("Published product {}", id);
    Ok(published)
}

/// Move a published product back to draft and release its counters.
pub async fn unpublish<R: FullRepository + ?Sized>(
    repo: &R,
    id: ProductId,
) -> ServiceResult<Product> {
    const NOT_PUBLISHED: &str = "Product is not published";
    let product = repo.get_product(id).await?;
    if !product.is_published() {
        return Err(ServiceError::field("status", NOT_PUBLISHED));
    }
    let draft = transition(repo, id, ProductStatus::Published, ProductStatus::Draft, NOT_PUBLISHED).await?;
    release_counters(repo, &product).await;
    info!("Unpublished product {}", id);
    Ok(draft)
}

/// Hard delete; a published product is unpublished first.
pub async fn delete<R: FullRepository + ?Sized>(repo: &R, id: ProductId) -> ServiceResult<Product> {
    let product = repo.get_product(id).await?;
    if product.is_published() {
        unpublish(repo, id).await?;
    }
    let deleted = repo.delete_product(id).await?;
    info!("Deleted product {} '{}'", id, deleted.title);
    Ok(deleted)
}

/// Decrement every counter the product holds. An item that has since been
/// deleted no longer has a counter to release, so misses are only logged.
async fn release_counters<R: FullRepository + ?Sized>(repo: &R, product: &Product) {
    for (kind, item_id) in product.taxonomy_refs() {
        if let Err(e) = repo.decrement_product_count(kind, item_id).await {
            warn!(
                "Could not release {} {} for product {}: {}",
                kind, item_id, product.id, e
            );
        }
    }
}
