//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic. Taxonomy handlers are shared by categories,
//! industries and tools; the router tags each resource with its
//! [`TaxonomyKind`] through an `Extension`.

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use chrono::Utc;

use super::dto::{AcceptedEvents, ApiResponse, HealthResponse, RequestInfo};
use super::error::AppError;
use super::state::AppState;
use crate::db::TaxonomyRepository;
use crate::models::{
    EventBatch, EventStats, ListQuery, NewProduct, NewPromocode, NewTaxonomyItem, Page, Product,
    ProductId, ProductQuery, Promocode, PromocodeApplication, PromocodeQuote, TaxonomyId,
    TaxonomyItem, TaxonomyKind, TaxonomyUpdate,
};
use crate::services::{events, products, promocodes, taxonomy};

/// Result type for handlers.
pub type HandlerResult<T> = Result<ApiResponse<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(
    State(state): State<AppState>,
    req: RequestInfo,
) -> HandlerResult<HealthResponse> {
    let database = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(ApiResponse::ok(
        req,
        "Service is running",
        HealthResponse {
            status: "ok".to_string(),
            version: "v1".to_string(),
            database,
        },
    ))
}

// =============================================================================
// Taxonomy (categories, industries, tools)
// =============================================================================

fn plural(kind: TaxonomyKind) -> &'static str {
    match kind {
        TaxonomyKind::Category => "Categories",
        TaxonomyKind::Industry => "Industries",
        TaxonomyKind::Tool => "Tools",
    }
}

/// GET /v1/{collection}
pub async fn list_items(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    req: RequestInfo,
    Query(query): Query<ListQuery>,
) -> HandlerResult<Page<TaxonomyItem>> {
    let page = taxonomy::list(state.repository.as_ref(), kind, &query).await?;
    Ok(ApiResponse::ok(
        req,
        format!("{} retrieved successfully", plural(kind)),
        page,
    ))
}

/// GET /v1/{collection}/active
pub async fn active_items(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    req: RequestInfo,
) -> HandlerResult<Vec<TaxonomyItem>> {
    let items = taxonomy::find_active(state.repository.as_ref(), kind).await?;
    Ok(ApiResponse::ok(
        req,
        format!("Active {} retrieved successfully", plural(kind).to_lowercase()),
        items,
    ))
}

/// GET /v1/{collection}/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    req: RequestInfo,
    Path(id): Path<TaxonomyId>,
) -> HandlerResult<TaxonomyItem> {
    let item = taxonomy::get(state.repository.as_ref(), kind, id).await?;
    Ok(ApiResponse::ok(
        req,
        format!("{} retrieved successfully", kind.display_name()),
        item,
    ))
}

/// POST /v1/{collection}
pub async fn create_item(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    req: RequestInfo,
    Json(body): Json<NewTaxonomyItem>,
) -> HandlerResult<TaxonomyItem> {
    let item = taxonomy::create(state.repository.as_ref(), kind, &body).await?;
    Ok(ApiResponse::created(
        req,
        format!("{} created successfully", kind.display_name()),
        item,
    ))
}

/// PUT /v1/{collection}/{id}
pub async fn update_item(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    req: RequestInfo,
    Path(id): Path<TaxonomyId>,
    Json(body): Json<TaxonomyUpdate>,
) -> HandlerResult<TaxonomyItem> {
    let item = taxonomy::update(state.repository.as_ref(), kind, id, &body).await?;
    Ok(ApiResponse::ok(
        req,
        format!("{} updated successfully", kind.display_name()),
        item,
    ))
}

/// PATCH /v1/{collection}/{id}/toggle-status
pub async fn toggle_item_status(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    req: RequestInfo,
    Path(id): Path<TaxonomyId>,
) -> HandlerResult<TaxonomyItem> {
    let item = taxonomy::toggle_status(state.repository.as_ref(), kind, id).await?;
    let verb = if item.is_active { "activated" } else { "deactivated" };
    Ok(ApiResponse::ok(
        req,
        format!("{} {} successfully", kind.display_name(), verb),
        item,
    ))
}

/// DELETE /v1/{collection}/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    req: RequestInfo,
    Path(id): Path<TaxonomyId>,
) -> HandlerResult<TaxonomyItem> {
    let item = taxonomy::delete(state.repository.as_ref(), kind, id).await?;
    Ok(ApiResponse::ok(
        req,
        format!("{} deleted successfully", kind.display_name()),
        item,
    ))
}

// =============================================================================
// Products
// =============================================================================

/// GET /v1/products
pub async fn list_products(
    State(state): State<AppState>,
    req: RequestInfo,
    Query(query): Query<ProductQuery>,
) -> HandlerResult<Page<Product>> {
    let page = products::list(state.repository.as_ref(), &query).await?;
    Ok(ApiResponse::ok(req, "Products retrieved successfully", page))
}

/// GET /v1/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    req: RequestInfo,
    Path(id): Path<ProductId>,
) -> HandlerResult<Product> {
    let product = products::get(state.repository.as_ref(), id).await?;
    Ok(ApiResponse::ok(req, "Product retrieved successfully", product))
}

/// POST /v1/products
pub async fn create_product(
    State(state): State<AppState>,
    req: RequestInfo,
    Json(body): Json<NewProduct>,
) -> HandlerResult<Product> {
    let product = products::create(state.repository.as_ref(), &body).await?;
    Ok(ApiResponse::created(req, "Product created successfully", product))
}

/// PATCH /v1/products/{id}/publish
pub async fn publish_product(
    State(state): State<AppState>,
    req: RequestInfo,
    Path(id): Path<ProductId>,
) -> HandlerResult<Product> {
    let product = products::publish(state.repository.as_ref(), id).await?;
    Ok(ApiResponse::ok(req, "Product published successfully", product))
}

/// PATCH /v1/products/{id}/unpublish
pub async fn unpublish_product(
    State(state): State<AppState>,
    req: RequestInfo,
    Path(id): Path<ProductId>,
) -> HandlerResult<Product> {
    let product = products::unpublish(state.repository.as_ref(), id).await?;
    Ok(ApiResponse::ok(req, "Product unpublished successfully", product))
}

/// DELETE /v1/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    req: RequestInfo,
    Path(id): Path<ProductId>,
) -> HandlerResult<Product> {
    let product = products::delete(state.repository.as_ref(), id).await?;
    Ok(ApiResponse::ok(req, "Product deleted successfully", product))
}

// =============================================================================
// Promocodes
// =============================================================================

/// GET /v1/promocode
pub async fn list_promocodes(
    State(state): State<AppState>,
    req: RequestInfo,
) -> HandlerResult<Vec<Promocode>> {
    let codes = promocodes::list(state.repository.as_ref()).await?;
    Ok(ApiResponse::ok(req, "Promocodes retrieved successfully", codes))
}

/// POST /v1/promocode
pub async fn create_promocode(
    State(state): State<AppState>,
    req: RequestInfo,
    Json(body): Json<NewPromocode>,
) -> HandlerResult<Promocode> {
    let promo = promocodes::create(state.repository.as_ref(), &body).await?;
    Ok(ApiResponse::created(req, "Promocode created successfully", promo))
}

/// POST /v1/promocode/validate
pub async fn validate_promocode(
    State(state): State<AppState>,
    req: RequestInfo,
    Json(body): Json<PromocodeApplication>,
) -> HandlerResult<PromocodeQuote> {
    let quote = promocodes::validate(state.repository.as_ref(), &body, Utc::now()).await?;
    Ok(ApiResponse::ok(req, "Promocode is valid", quote))
}

/// POST /v1/promocode/redeem
pub async fn redeem_promocode(
    State(state): State<AppState>,
    req: RequestInfo,
    Json(body): Json<PromocodeApplication>,
) -> HandlerResult<PromocodeQuote> {
    let quote = promocodes::redeem(state.repository.as_ref(), &body, Utc::now()).await?;
    Ok(ApiResponse::ok(req, "Promocode redeemed successfully", quote))
}

// =============================================================================
// Analytics
// =============================================================================

/// POST /v1/analytics/events
///
/// Stores the batch and answers 202 with the number of events accepted.
pub async fn ingest_events(
    State(state): State<AppState>,
    req: RequestInfo,
    Json(batch): Json<EventBatch>,
) -> HandlerResult<AcceptedEvents> {
    let accepted =
        events::ingest(state.repository.as_ref(), &batch, state.max_batch_events).await?;
    Ok(ApiResponse::accepted(
        req,
        "Events accepted",
        AcceptedEvents { accepted },
    ))
}

/// GET /v1/analytics/stats
pub async fn event_stats(
    State(state): State<AppState>,
    req: RequestInfo,
) -> HandlerResult<EventStats> {
    let stats = events::stats(state.repository.as_ref()).await?;
    Ok(ApiResponse::ok(req, "Event stats retrieved successfully", stats))
}
