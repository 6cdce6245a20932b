//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing,
//! error envelope, admin guard), and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, MethodRouter},
    Extension, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::middleware::{envelope_errors, require_admin};
use super::state::AppState;
use crate::models::TaxonomyKind;

/// Put a route behind the admin token check.
fn admin(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(state.clone(), require_admin))
}

/// The seven routes shared by categories, industries and tools.
fn taxonomy_routes(kind: TaxonomyKind, state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_items).merge(admin(post(handlers::create_item), state)),
        )
        .route("/active", get(handlers::active_items))
        .route(
            "/{id}",
            get(handlers::get_item)
                .merge(admin(axum::routing::put(handlers::update_item), state))
                .merge(admin(axum::routing::delete(handlers::delete_item), state)),
        )
        .route(
            "/{id}/toggle-status",
            admin(patch(handlers::toggle_item_status), state),
        )
        .layer(Extension(kind))
}

fn product_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).merge(admin(post(handlers::create_product), state)),
        )
        .route(
            "/{id}",
            get(handlers::get_product)
                .merge(admin(axum::routing::delete(handlers::delete_product), state)),
        )
        .route(
            "/{id}/publish",
            admin(patch(handlers::publish_product), state),
        )
        .route(
            "/{id}/unpublish",
            admin(patch(handlers::unpublish_product), state),
        )
}

fn promocode_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            admin(get(handlers::list_promocodes), state)
                .merge(admin(post(handlers::create_promocode), state)),
        )
        .route("/validate", post(handlers::validate_promocode))
        .route("/redeem", post(handlers::redeem_promocode))
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut api_v1 = Router::new();
    for kind in TaxonomyKind::ALL {
        api_v1 = api_v1.nest(
            &format!("/{}", kind.collection()),
            taxonomy_routes(kind, &state),
        );
    }
    let api_v1 = api_v1
        .nest("/products", product_routes(&state))
        .nest("/promocode", promocode_routes(&state))
        .route("/analytics/events", post(handlers::ingest_events))
        .route("/analytics/stats", get(handlers::event_stats));

    let body_limit = state.body_limit_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(from_fn(envelope_errors))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
