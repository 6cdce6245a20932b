//! End-to-end flows through the HTTP router.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use marketplace::db::{FullRepository, LocalRepository};
use marketplace::http::{create_router, AppState};

fn app() -> Router {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    create_router(AppState::new(repo))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create(app: &Router, collection: &str, name: &str) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        &format!("/v1/{}", collection),
        Some(json!({ "name": name, "icon": "Package" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn category_lifecycle() {
    let app = app();
    create(&app, "categories", "Marketing").await;
    create(&app, "categories", "Finance").await;

    let (status, body) = call(&app, Method::GET, "/v1/categories?sort=name&order=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["request"]["method"], "GET");
    let names: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Finance", "Marketing"]);
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/categories",
        Some(json!({ "name": "marketing", "icon": "Megaphone" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 409);
    assert_eq!(body["errors"][0]["field"], "name");
}

#[tokio::test]
async fn toggle_hides_item_from_active_listing() {
    let app = app();
    let id = create(&app, "tools", "Figma").await;

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/v1/tools/{}/toggle-status", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    let (_, body) = call(&app, Method::GET, "/v1/tools/active", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn publish_tracks_counters_and_guards_delete() {
    let app = app();
    let category = create(&app, "categories", "Templates").await;
    let industry = create(&app, "industries", "Design").await;
    let tool = create(&app, "tools", "Notion").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/products",
        Some(json!({
            "title": "Content calendar",
            "price": 1999,
            "categoryId": category,
            "industryId": industry,
            "toolIds": [tool],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let product = body["data"]["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/v1/products/{}/publish", product),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, Method::GET, &format!("/v1/tools/{}", tool), None).await;
    assert_eq!(body["data"]["productCount"], 1);

    let (status, body) = call(&app, Method::DELETE, &format!("/v1/tools/{}", tool), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/v1/products/{}", product),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, Method::GET, &format!("/v1/tools/{}", tool), None).await;
    assert_eq!(body["data"]["productCount"], 0);

    let (status, _) = call(&app, Method::DELETE, &format!("/v1/tools/{}", tool), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, &format!("/v1/tools/{}", tool), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_with_unknown_category_is_rejected() {
    let app = app();
    let industry = create(&app, "industries", "Retail").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/products",
        Some(json!({
            "title": "Storefront kit",
            "price": 500,
            "categoryId": 999,
            "industryId": industry,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "categoryId");
}

#[tokio::test]
async fn promocode_expiry_and_exhaustion() {
    let app = app();
    let now = Utc::now();

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/promocode",
        Some(json!({
            "code": "OLD10",
            "discountType": "percentage",
            "discountValue": 10,
            "validFrom": now - Duration::days(10),
            "validUntil": now - Duration::days(1),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/promocode/validate",
        Some(json!({ "code": "OLD10", "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "Promocode has expired");

    let (status, _) = call(
        &app,
        Method::POST,
        "/v1/promocode",
        Some(json!({
            "code": "ONCE",
            "discountType": "fixed",
            "discountValue": 300,
            "maxUses": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/promocode/redeem",
        Some(json!({ "code": "ONCE", "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["finalAmount"], 700);

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/promocode/redeem",
        Some(json!({ "code": "ONCE", "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "Promocode usage limit reached");
}

#[tokio::test]
async fn promocode_quote_on_very_large_amount() {
    let app = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/v1/promocode",
        Some(json!({
            "code": "SAVE15",
            "discountType": "percentage",
            "discountValue": 15,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/promocode/validate",
        Some(json!({ "code": "SAVE15", "amount": 9_000_000_000_000_000_000i64 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["discount"], 1_350_000_000_000_000_000i64);
    assert_eq!(body["data"]["finalAmount"], 7_650_000_000_000_000_000i64);
}
