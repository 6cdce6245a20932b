//! In-memory local repository implementation.
//!
//! All data lives in `HashMap`s behind a single `parking_lot::RwLock`. Each
//! trait method takes the lock once, so every call is atomic with respect to
//! the others, the same guarantee a document store gives for single-record
//! writes. There are no cross-call transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::promocode::normalize_code;
use crate::models::*;

/// Ingested events retained before the oldest are discarded.
pub const MAX_RETAINED_EVENTS: usize = 50_000;

/// In-memory local repository.
///
/// # Example
/// ```
/// use marketplace::db::repositories::LocalRepository;
/// use marketplace::db::repository::TaxonomyRepository;
/// use marketplace::models::{NewTaxonomyItem, TaxonomyKind};
///
/// # #[tokio::main]
/// # async fn main() {
/// let repo = LocalRepository::new();
/// repo.insert_item(TaxonomyKind::Category, &NewTaxonomyItem::new("Marketing"))
///     .await
///     .unwrap();
/// assert_eq!(repo.item_count(TaxonomyKind::Category), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    taxonomy: HashMap<TaxonomyKind, HashMap<TaxonomyId, TaxonomyItem>>,
    products: HashMap<ProductId, Product>,
    promocodes: HashMap<String, Promocode>,
    events: VecDeque<StoredEvent>,

    // ID counters
    next_taxonomy_id: TaxonomyId,
    next_product_id: ProductId,
    next_promocode_id: PromocodeId,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            taxonomy: HashMap::new(),
            products: HashMap::new(),
            promocodes: HashMap::new(),
            events: VecDeque::new(),
            next_taxonomy_id: TaxonomyId(1),
            next_product_id: ProductId(1),
            next_promocode_id: PromocodeId(1),
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn visible(&self, kind: TaxonomyKind) -> impl Iterator<Item = &TaxonomyItem> {
        self.taxonomy
            .get(&kind)
            .into_iter()
            .flat_map(|items| items.values())
            .filter(|item| item.is_visible())
    }

    fn name_taken(&self, kind: TaxonomyKind, name: &str, except: Option<TaxonomyId>) -> bool {
        self.visible(kind)
            .any(|item| Some(item.id) != except && item.has_name(name))
    }

    fn item_mut(&mut self, kind: TaxonomyKind, id: TaxonomyId) -> RepositoryResult<&mut TaxonomyItem> {
        self.taxonomy
            .get_mut(&kind)
            .and_then(|items| items.get_mut(&id))
            .filter(|item| item.is_visible())
            .ok_or_else(|| taxonomy_not_found(kind, id))
    }
}

fn taxonomy_not_found(kind: TaxonomyKind, id: TaxonomyId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} not found", kind.display_name()),
        ErrorContext::default()
            .with_entity(kind.display_name().to_lowercase())
            .with_entity_id(id),
    )
}

fn duplicate_name(kind: TaxonomyKind, operation: &str) -> RepositoryError {
    RepositoryError::conflict_with_context(
        format!("{} with this name already exists", kind.display_name()),
        ErrorContext::new(operation)
            .with_entity(kind.display_name().to_lowercase())
            .with_field("name"),
    )
}

fn product_not_found(id: ProductId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        "Product not found",
        ErrorContext::default()
            .with_entity("product")
            .with_entity_id(id),
    )
}

fn promocode_not_found(code: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        "Promocode not found",
        ErrorContext::default()
            .with_entity("promocode")
            .with_entity_id(code),
    )
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Number of visible items of a kind.
    pub fn item_count(&self, kind: TaxonomyKind) -> usize {
        self.data.read().visible(kind).count()
    }

    /// Number of ingested events currently retained.
    pub fn event_count(&self) -> usize {
        self.data.read().events.len()
    }

    /// Fetch an item even if soft-deleted.
    pub fn get_item_raw(&self, kind: TaxonomyKind, id: TaxonomyId) -> Option<TaxonomyItem> {
        self.data
            .read()
            .taxonomy
            .get(&kind)
            .and_then(|items| items.get(&id))
            .cloned()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }

    fn update_item_with<F>(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
        apply: F,
    ) -> RepositoryResult<TaxonomyItem>
    where
        F: FnOnce(&mut TaxonomyItem) -> RepositoryResult<()>,
    {
        self.check_health()?;
        let mut data = self.data.write();
        let item = data.item_mut(kind, id)?;
        apply(&mut *item)?;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaxonomyRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_item(
        &self,
        kind: TaxonomyKind,
        item: &NewTaxonomyItem,
    ) -> RepositoryResult<TaxonomyItem> {
        self.check_health()?;
        let mut data = self.data.write();

        let name = item.name.trim().to_string();
        if data.name_taken(kind, &name, None) {
            return Err(duplicate_name(kind, "insert_item"));
        }

        let id = data.next_taxonomy_id;
        data.next_taxonomy_id = id.next();

        let now = Utc::now();
        let stored = TaxonomyItem {
            id,
            kind,
            name,
            icon: item
                .icon
                .as_deref()
                .map(str::trim)
                .filter(|icon| !icon.is_empty())
                .unwrap_or(DEFAULT_ICON)
                .to_string(),
            is_active: item.is_active.unwrap_or(true),
            product_count: 0,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        data.taxonomy
            .entry(kind)
            .or_default()
            .insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_item(&self, kind: TaxonomyKind, id: TaxonomyId) -> RepositoryResult<TaxonomyItem> {
        self.check_health()?;
        self.data
            .read()
            .visible(kind)
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| taxonomy_not_found(kind, id))
    }

    async fn find_by_name(
        &self,
        kind: TaxonomyKind,
        name: &str,
    ) -> RepositoryResult<Option<TaxonomyItem>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .visible(kind)
            .find(|item| item.has_name(name))
            .cloned())
    }

    async fn list_items(
        &self,
        kind: TaxonomyKind,
        params: &ListParams,
    ) -> RepositoryResult<Page<TaxonomyItem>> {
        self.check_health()?;
        let data = self.data.read();
        let mut items: Vec<TaxonomyItem> = data
            .visible(kind)
            .filter(|item| params.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| params.compare(a, b));
        Ok(Page::from_sorted(items, params))
    }

    async fn find_active(&self, kind: TaxonomyKind) -> RepositoryResult<Vec<TaxonomyItem>> {
        self.check_health()?;
        let params = ListParams::default();
        let mut items: Vec<TaxonomyItem> = self
            .data
            .read()
            .visible(kind)
            .filter(|item| item.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| params.compare(a, b));
        Ok(items)
    }

    async fn update_item(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
        update: &TaxonomyUpdate,
    ) -> RepositoryResult<TaxonomyItem> {
        self.check_health()?;
        let mut data = self.data.write();

        if let Some(name) = &update.name {
            // Existence first so a missing id reports 404 rather than 409.
            data.item_mut(kind, id)?;
            if data.name_taken(kind, name, Some(id)) {
                return Err(duplicate_name(kind, "update_item"));
            }
        }

        let item = data.item_mut(kind, id)?;
        if let Some(name) = &update.name {
            item.name = name.trim().to_string();
        }
        if let Some(icon) = &update.icon {
            item.icon = icon.trim().to_string();
        }
        if let Some(active) = update.is_active {
            item.is_active = active;
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn toggle_status(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
    ) -> RepositoryResult<TaxonomyItem> {
        self.update_item_with(kind, id, |item| {
            item.is_active = !item.is_active;
            Ok(())
        })
    }

    async fn soft_delete(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
    ) -> RepositoryResult<TaxonomyItem> {
        self.update_item_with(kind, id, |item| {
            if item.product_count > 0 {
                return Err(RepositoryError::validation_with_context(
                    format!(
                        "Cannot delete {} with {} associated products",
                        kind.display_name().to_lowercase(),
                        item.product_count
                    ),
                    ErrorContext::new("soft_delete")
                        .with_entity(kind.display_name().to_lowercase())
                        .with_entity_id(id),
                ));
            }
            item.is_deleted = true;
            item.is_active = false;
            item.deleted_at = Some(Utc::now());
            Ok(())
        })
    }

    async fn increment_product_count(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
    ) -> RepositoryResult<TaxonomyItem> {
        self.update_item_with(kind, id, |item| {
            item.product_count = item.product_count.saturating_add(1);
            Ok(())
        })
    }

    async fn decrement_product_count(
        &self,
        kind: TaxonomyKind,
        id: TaxonomyId,
    ) -> RepositoryResult<TaxonomyItem> {
        self.update_item_with(kind, id, |item| {
            item.product_count = item.product_count.saturating_sub(1);
            Ok(())
        })
    }
}

#[async_trait]
impl ProductRepository for LocalRepository {
    async fn insert_product(&self, product: &NewProduct) -> RepositoryResult<Product> {
        self.check_health()?;
        let mut data = self.data.write();

        let id = data.next_product_id;
        data.next_product_id = id.next();

        let now = Utc::now();
        let stored = Product {
            id,
            title: product.title.trim().to_string(),
            description: product
                .description
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            price: product.price,
            category_id: product.category_id,
            industry_id: product.industry_id,
            tool_ids: product.tool_ids.clone(),
            status: ProductStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        data.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product> {
        self.check_health()?;
        self.data
            .read()
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| product_not_found(id))
    }

    async fn list_products(&self, query: &ProductQuery) -> RepositoryResult<Page<Product>> {
        self.check_health()?;
        let mut products: Vec<Product> = self
            .data
            .read()
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let params = ListQuery {
            page: Some(query.page()),
            limit: Some(query.limit()),
            ..Default::default()
        }
        .normalized();
        Ok(Page::from_sorted(products, &params))
    }

    async fn transition_product_status(
        &self,
        id: ProductId,
        from: ProductStatus,
        to: ProductStatus,
    ) -> RepositoryResult<Product> {
        self.check_health()?;
        let mut data = self.data.write();
        let product = data.products.get_mut(&id).ok_or_else(|| product_not_found(id))?;
        if product.status != from {
            return Err(RepositoryError::validation_with_context(
                format!("Product is {}, expected {}", product.status.as_str(), from.as_str()),
                ErrorContext::new("transition_product_status")
                    .with_entity("product")
                    .with_entity_id(id)
                    .with_field("status"),
            ));
        }

        let now = Utc::now();
        product.status = to;
        product.published_at = match to {
            ProductStatus::Published => Some(now),
            ProductStatus::Draft => None,
        };
        product.updated_at = now;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> RepositoryResult<Product> {
        self.check_health()?;
        self.data
            .write()
            .products
            .remove(&id)
            .ok_or_else(|| product_not_found(id))
    }
}

#[async_trait]
impl PromocodeRepository for LocalRepository {
    async fn insert_promocode(&self, promocode: &NewPromocode) -> RepositoryResult<Promocode> {
        self.check_health()?;
        let mut data = self.data.write();

        let code = normalize_code(&promocode.code);
        if data.promocodes.contains_key(&code) {
            return Err(RepositoryError::conflict_with_context(
                "Promocode already exists",
                ErrorContext::new("insert_promocode")
                    .with_entity("promocode")
                    .with_field("code"),
            ));
        }

        let id = data.next_promocode_id;
        data.next_promocode_id = id.next();

        let now = Utc::now();
        let stored = Promocode {
            id,
            code: code.clone(),
            discount_type: promocode.discount_type,
            discount_value: promocode.discount_value,
            max_uses: promocode.max_uses,
            used_count: 0,
            min_purchase_amount: promocode.min_purchase_amount,
            valid_from: promocode.valid_from.unwrap_or(now),
            valid_until: promocode.valid_until,
            is_active: promocode.is_active.unwrap_or(true),
            created_at: now,
        };
        data.promocodes.insert(code, stored.clone());
        Ok(stored)
    }

    async fn get_promocode(&self, code: &str) -> RepositoryResult<Promocode> {
        self.check_health()?;
        let code = normalize_code(code);
        self.data
            .read()
            .promocodes
            .get(&code)
            .cloned()
            .ok_or_else(|| promocode_not_found(&code))
    }

    async fn list_promocodes(&self) -> RepositoryResult<Vec<Promocode>> {
        self.check_health()?;
        let mut codes: Vec<Promocode> = self.data.read().promocodes.values().cloned().collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(codes)
    }

    async fn redeem_promocode(
        &self,
        code: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Promocode> {
        self.check_health()?;
        let code = normalize_code(code);
        let mut data = self.data.write();
        let promo = data
            .promocodes
            .get_mut(&code)
            .ok_or_else(|| promocode_not_found(&code))?;

        promo.check(amount, now).map_err(|rejection| {
            RepositoryError::validation_with_context(
                rejection.to_string(),
                ErrorContext::new("redeem_promocode")
                    .with_entity("promocode")
                    .with_entity_id(&code),
            )
        })?;
        promo.used_count += 1;
        Ok(promo.clone())
    }
}

#[async_trait]
impl EventRepository for LocalRepository {
    async fn store_events(&self, events: &[AnalyticsEvent]) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write();
        let received_at = Utc::now();
        for event in events {
            data.events.push_back(StoredEvent {
                event: event.clone(),
                received_at,
            });
        }
        while data.events.len() > MAX_RETAINED_EVENTS {
            data.events.pop_front();
        }
        Ok(events.len())
    }

    async fn event_stats(&self) -> RepositoryResult<EventStats> {
        self.check_health()?;
        let data = self.data.read();
        let mut stats = EventStats {
            total: data.events.len(),
            ..Default::default()
        };
        let mut sessions = HashSet::new();
        for stored in &data.events {
            *stats.by_type.entry(stored.event.event_type).or_insert(0) += 1;
            sessions.insert(stored.event.session_id.as_str());
        }
        stats.sessions = sessions.len();
        Ok(stats)
    }

    async fn recent_events(&self, limit: usize) -> RepositoryResult<Vec<StoredEvent>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .events
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> NewTaxonomyItem {
        NewTaxonomyItem::new(name).with_icon("Package")
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_defaults() {
        let repo = LocalRepository::new();
        let first = repo
            .insert_item(TaxonomyKind::Category, &NewTaxonomyItem::new("Marketing"))
            .await
            .unwrap();
        let second = repo
            .insert_item(TaxonomyKind::Tool, &NewTaxonomyItem::new("ChatGPT"))
            .await
            .unwrap();

        assert_eq!(first.id, TaxonomyId::new(1));
        assert_eq!(second.id, TaxonomyId::new(2));
        assert_eq!(first.icon, DEFAULT_ICON);
        assert!(first.is_active);
        assert_eq!(first.product_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict_case_insensitive() {
        let repo = LocalRepository::new();
        repo.insert_item(TaxonomyKind::Category, &category("Marketing"))
            .await
            .unwrap();
        let err = repo
            .insert_item(TaxonomyKind::Category, &category("  MARKETING "))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_same_name_allowed_across_kinds() {
        let repo = LocalRepository::new();
        repo.insert_item(TaxonomyKind::Category, &category("Finance"))
            .await
            .unwrap();
        assert!(repo
            .insert_item(TaxonomyKind::Industry, &category("Finance"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_soft_deleted_name_can_be_reused() {
        let repo = LocalRepository::new();
        let item = repo
            .insert_item(TaxonomyKind::Industry, &category("Retail"))
            .await
            .unwrap();
        repo.soft_delete(TaxonomyKind::Industry, item.id).await.unwrap();
        assert!(repo
            .insert_item(TaxonomyKind::Industry, &category("retail"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_item_but_keeps_record() {
        let repo = LocalRepository::new();
        let item = repo
            .insert_item(TaxonomyKind::Tool, &category("Zapier"))
            .await
            .unwrap();
        let deleted = repo.soft_delete(TaxonomyKind::Tool, item.id).await.unwrap();
        assert!(deleted.is_deleted);
        assert!(!deleted.is_active);
        assert!(deleted.deleted_at.is_some());

        let err = repo.get_item(TaxonomyKind::Tool, item.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert!(repo.get_item_raw(TaxonomyKind::Tool, item.id).is_some());
        assert_eq!(repo.item_count(TaxonomyKind::Tool), 0);
    }

    #[tokio::test]
    async fn test_soft_delete_rejected_with_products() {
        let repo = LocalRepository::new();
        let item = repo
            .insert_item(TaxonomyKind::Category, &category("Sales"))
            .await
            .unwrap();
        repo.increment_product_count(TaxonomyKind::Category, item.id)
            .await
            .unwrap();
        let err = repo
            .soft_delete(TaxonomyKind::Category, item.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert!(repo.get_item(TaxonomyKind::Category, item.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_decrement_saturates_at_zero() {
        let repo = LocalRepository::new();
        let item = repo
            .insert_item(TaxonomyKind::Category, &category("Ops"))
            .await
            .unwrap();
        let item = repo
            .decrement_product_count(TaxonomyKind::Category, item.id)
            .await
            .unwrap();
        assert_eq!(item.product_count, 0);
    }

    #[tokio::test]
    async fn test_update_rename_conflict_excludes_self() {
        let repo = LocalRepository::new();
        let a = repo
            .insert_item(TaxonomyKind::Category, &category("Alpha"))
            .await
            .unwrap();
        repo.insert_item(TaxonomyKind::Category, &category("Beta"))
            .await
            .unwrap();

        let renamed = repo
            .update_item(
                TaxonomyKind::Category,
                a.id,
                &TaxonomyUpdate {
                    name: Some("ALPHA".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "ALPHA");

        let err = repo
            .update_item(
                TaxonomyKind::Category,
                a.id,
                &TaxonomyUpdate {
                    name: Some("beta".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo
            .update_item(
                TaxonomyKind::Category,
                TaxonomyId::new(42),
                &TaxonomyUpdate {
                    name: Some("Whatever".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unhealthy_repository_rejects_writes() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        let err = repo
            .insert_item(TaxonomyKind::Category, &category("Down"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(!repo.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_redeem_counts_uses_until_exhausted() {
        let repo = LocalRepository::new();
        repo.insert_promocode(&NewPromocode {
            code: "once".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 500,
            max_uses: Some(1),
            min_purchase_amount: None,
            valid_from: None,
            valid_until: None,
            is_active: None,
        })
        .await
        .unwrap();

        let redeemed = repo.redeem_promocode("ONCE", 1000, Utc::now()).await.unwrap();
        assert_eq!(redeemed.used_count, 1);

        let err = repo
            .redeem_promocode("once", 1000, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(err.message(), "Promocode usage limit reached");
    }

    #[tokio::test]
    async fn test_event_stats_counts_by_type_and_session() {
        let repo = LocalRepository::new();
        let events = vec![
            AnalyticsEvent::new(EventType::Click, "cta", Properties::new(), "s1", None),
            AnalyticsEvent::new(EventType::Click, "cta", Properties::new(), "s2", None),
            AnalyticsEvent::new(EventType::Error, "boom", Properties::new(), "s1", None),
        ];
        assert_eq!(repo.store_events(&events).await.unwrap(), 3);

        let stats = repo.event_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.get(&EventType::Click), Some(&2));
        assert_eq!(stats.sessions, 2);

        let recent = repo.recent_events(1).await.unwrap();
        assert_eq!(recent[0].event.name, "boom");
    }
}
