mod common;

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::EntityTrait;
use uuid::Uuid;

use common::{seed_catalog_item, spawn_app};
use storefront_api::entities::CatalogItem;
use storefront_api::errors::ServiceError;
use storefront_api::events;
use storefront_api::services::catalog::CatalogService;

async fn catalog_service(app: &common::TestApp) -> CatalogService {
    let (event_sender, event_rx) = events::channel();
    tokio::spawn(events::process_events(event_rx));
    CatalogService::new(app.db.clone(), Arc::new(event_sender), 10)
}

async fn reserved(app: &common::TestApp, item: Uuid) -> i64 {
    CatalogItem::find_by_id(item)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap()
        .ordered_quantity
}

#[tokio::test]
async fn reservation_accumulates_within_capacity() {
    let app = spawn_app().await;
    let item = seed_catalog_item(&app.db, "LP", 1000, Some(5), None, None).await;
    let service = catalog_service(&app).await;

    service
        .reserve_items(&HashMap::from([(item, 3)]))
        .await
        .unwrap();
    service
        .reserve_items(&HashMap::from([(item, 2)]))
        .await
        .unwrap();

    assert_eq!(reserved(&app, item).await, 5);
}

#[tokio::test]
async fn oversell_is_rejected_and_nothing_is_reserved() {
    let app = spawn_app().await;
    let item = seed_catalog_item(&app.db, "LP", 1000, Some(5), None, None).await;
    let service = catalog_service(&app).await;

    service
        .reserve_items(&HashMap::from([(item, 3)]))
        .await
        .unwrap();

    // 3 already taken; another 3 would exceed the capacity of 5.
    let err = service
        .reserve_items(&HashMap::from([(item, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    assert_eq!(reserved(&app, item).await, 3);
}

#[tokio::test]
async fn concurrent_reservations_have_one_winner() {
    let app = spawn_app().await;
    let item = seed_catalog_item(&app.db, "Limited LP", 4000, Some(5), None, None).await;
    let service = catalog_service(&app).await;

    // Two 3-unit attempts against a capacity of 5, in flight at once.
    let first_request = HashMap::from([(item, 3)]);
    let second_request = HashMap::from([(item, 3)]);
    let (first, second) = tokio::join!(
        service.reserve_items(&first_request),
        service.reserve_items(&second_request)
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(ServiceError::InsufficientStock(_)))));

    assert_eq!(reserved(&app, item).await, 3);
}

#[tokio::test]
async fn failed_batch_rolls_back_all_lines() {
    let app = spawn_app().await;
    let plenty = seed_catalog_item(&app.db, "Common LP", 1000, Some(100), None, None).await;
    let scarce = seed_catalog_item(&app.db, "Rare LP", 4000, Some(1), None, None).await;
    let service = catalog_service(&app).await;

    let err = service
        .reserve_items(&HashMap::from([(plenty, 2), (scarce, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // All-or-nothing: the fulfillable line must not stick either.
    assert_eq!(reserved(&app, plenty).await, 0);
    assert_eq!(reserved(&app, scarce).await, 0);
}

#[tokio::test]
async fn unbounded_stock_never_oversells() {
    let app = spawn_app().await;
    let item = seed_catalog_item(&app.db, "Open edition", 900, None, None, None).await;
    let service = catalog_service(&app).await;

    service
        .reserve_items(&HashMap::from([(item, 250)]))
        .await
        .unwrap();

    assert_eq!(reserved(&app, item).await, 250);
}

#[tokio::test]
async fn reserving_unknown_item_fails() {
    let app = spawn_app().await;
    let service = catalog_service(&app).await;

    let err = service
        .reserve_items(&HashMap::from([(Uuid::new_v4(), 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
