mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{seed_catalog_item, seed_preorder, spawn_app};

#[tokio::test]
async fn verify_partitions_available_and_adjusted() {
    let app = spawn_app().await;
    let in_stock = seed_catalog_item(&app.db, "Blue LP", 1500, Some(5), None, None).await;
    let scarce = seed_catalog_item(&app.db, "Rare EP", 4000, Some(2), None, None).await;
    let user = Uuid::new_v4();

    let (status, body) = app
        .verify_checkout(
            user,
            json!([
                { "id": in_stock, "quantity": 3 },
                { "id": scarce, "quantity": 4 }
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], false);
    let available = body["available_items"].as_array().unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0]["id"], json!(in_stock));
    assert_eq!(available[0]["quantity"], 3);
    assert_eq!(available[0]["price"], 1500);
    assert_eq!(available[0]["title"], "Blue LP");

    let adjusted = body["adjusted_items"].as_array().unwrap();
    assert_eq!(adjusted.len(), 1);
    assert_eq!(adjusted[0]["id"], json!(scarce));
    assert_eq!(adjusted[0]["quantity"], 2);
}

#[tokio::test]
async fn verify_caps_unbounded_stock_to_cart_limit() {
    let app = spawn_app().await;
    let item = seed_catalog_item(&app.db, "Open edition", 900, None, None, None).await;
    let user = Uuid::new_v4();

    let (status, body) = app
        .verify_checkout(user, json!([{ "id": item, "quantity": 11 }]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adjusted_items"][0]["quantity"], 10);
}

#[tokio::test]
async fn verify_includes_credit_schedule() {
    let app = spawn_app().await;
    let item =
        seed_catalog_item(&app.db, "Box set", 3000, Some(10), None, Some(&[1000, 1000, 1000]))
            .await;
    let user = Uuid::new_v4();

    let (status, body) = app
        .verify_checkout(user, json!([{ "id": item, "quantity": 1 }]))
        .await;

    assert_eq!(status, StatusCode::OK);
    let parts = body["available_items"][0]["credit_parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["sum"], 1000);
}

#[tokio::test]
async fn verify_rejects_mixed_sections() {
    let app = spawn_app().await;
    let batch = seed_preorder(&app.db, "Autumn batch").await;
    let preorder_item =
        seed_catalog_item(&app.db, "Preorder LP", 2000, None, Some(batch), None).await;
    let stock_item = seed_catalog_item(&app.db, "Stock LP", 1500, Some(5), None, None).await;
    let user = Uuid::new_v4();

    let (status, body) = app
        .verify_checkout(
            user,
            json!([
                { "id": preorder_item, "quantity": 1 },
                { "id": stock_item, "quantity": 1 }
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("different sections"));
}

#[tokio::test]
async fn verify_fails_on_unknown_item() {
    let app = spawn_app().await;
    let known = seed_catalog_item(&app.db, "Known", 1000, Some(1), None, None).await;
    let user = Uuid::new_v4();

    let (status, _) = app
        .verify_checkout(
            user,
            json!([
                { "id": known, "quantity": 1 },
                { "id": Uuid::new_v4(), "quantity": 1 }
            ]),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verify_rejects_empty_and_nonpositive_requests() {
    let app = spawn_app().await;
    let item = seed_catalog_item(&app.db, "LP", 1000, Some(5), None, None).await;
    let user = Uuid::new_v4();

    let (status, _) = app.verify_checkout(user, json!([])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .verify_checkout(user, json!([{ "id": item, "quantity": 0 }]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stored_checkout_is_returned_until_consumed() {
    let app = spawn_app().await;
    let item = seed_catalog_item(&app.db, "LP", 1000, Some(5), None, None).await;
    let user = Uuid::new_v4();

    let (status, _) = app
        .request(Method::GET, "/api/v1/checkout", Some(user), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .verify_checkout(user, json!([{ "id": item, "quantity": 2 }]))
        .await;
    assert_eq!(body["ready"], true);

    let (status, body) = app
        .request(Method::GET, "/api/v1/checkout", Some(user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = spawn_app().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn checkout_requires_identity() {
    let app = spawn_app().await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            None,
            Some(json!({ "items": [] })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
