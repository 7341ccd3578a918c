//! Shared test harness: in-memory database, mocked payment gateway and a
//! fully wired router.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_api::auth::{USER_EMAIL_HEADER, USER_ID_HEADER, USER_PHONE_HEADER};
use storefront_api::config::{AppConfig, CheckoutConfig, GatewayConfig};
use storefront_api::db::{run_migrations, DbPool};
use storefront_api::entities::{catalog_item, credit_part, credit_plan, preorder, product, publication};
use storefront_api::events;
use storefront_api::gateway::PaymentGatewayClient;
use storefront_api::{app_router, AppState};

pub const GATEWAY_PASSWORD: &str = "test_password_1";
pub const TERMINAL_KEY: &str = "TestTerminal";

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DbPool>,
    pub gateway: MockServer,
}

pub async fn spawn_app() -> TestApp {
    let gateway = MockServer::start().await;

    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        log_json: false,
        auto_migrate: true,
        gateway: GatewayConfig {
            url: gateway.uri(),
            terminal_key: TERMINAL_KEY.to_string(),
            password: GATEWAY_PASSWORD.to_string(),
            notification_url: "https://shop.example.com/api/v1/webhooks/payment-status"
                .to_string(),
            timeout_secs: 5,
        },
        checkout: CheckoutConfig::default(),
    };

    // A single connection keeps every query on the same in-memory database.
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5));
    let db = Arc::new(Database::connect(options).await.expect("connect sqlite"));
    run_migrations(db.as_ref()).await.expect("run migrations");

    let gateway_client =
        Arc::new(PaymentGatewayClient::new(&config.gateway).expect("gateway client"));
    let (event_sender, event_rx) = events::channel();
    tokio::spawn(events::process_events(event_rx));

    let state = AppState::new(
        db.clone(),
        Arc::new(config),
        gateway_client,
        Arc::new(event_sender),
    );

    TestApp {
        router: app_router(state),
        db,
        gateway,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = user_id {
            builder = builder
                .header(USER_ID_HEADER, id.to_string())
                .header(USER_EMAIL_HEADER, "buyer@example.com")
                .header(USER_PHONE_HEADER, "+79990000000");
        }
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        let request = builder.body(body).expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("route request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, value)
    }

    pub async fn verify_checkout(&self, user_id: Uuid, items: Value) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/v1/checkout",
            Some(user_id),
            Some(json!({ "items": items })),
        )
        .await
    }

    pub async fn create_order(&self, user_id: Uuid, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, "/api/v1/orders", Some(user_id), Some(body))
            .await
    }
}

/// Inserts a product, a publication and a catalog item, optionally with a
/// credit plan. Returns the catalog item id.
pub async fn seed_catalog_item(
    db: &DbPool,
    title: &str,
    price: i64,
    quantity: Option<i64>,
    preorder_id: Option<Uuid>,
    credit_sums: Option<&[i64]>,
) -> Uuid {
    let now = Utc::now();

    let product_id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(product_id),
        title: Set(title.to_string()),
        description: Set(None),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("insert product");

    let publication_id = Uuid::new_v4();
    publication::ActiveModel {
        id: Set(publication_id),
        link: Set(format!("pub-{publication_id}")),
        preorder_id: Set(preorder_id),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("insert publication");

    let credit_plan_id = match credit_sums {
        Some(sums) => {
            let plan_id = Uuid::new_v4();
            credit_plan::ActiveModel {
                id: Set(plan_id),
                title: Set(format!("{title} installments")),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(db)
            .await
            .expect("insert credit plan");
            for (index, sum) in sums.iter().enumerate() {
                credit_part::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    credit_plan_id: Set(plan_id),
                    part_index: Set(index as i32),
                    sum: Set(*sum),
                    deadline: Set(NaiveDate::from_ymd_opt(2027, (index as u32 % 12) + 1, 15)
                        .expect("valid date")),
                    created_at: Set(now),
                    updated_at: Set(None),
                }
                .insert(db)
                .await
                .expect("insert credit part");
            }
            Some(plan_id)
        }
        None => None,
    };

    let item_id = Uuid::new_v4();
    catalog_item::ActiveModel {
        id: Set(item_id),
        publication_id: Set(publication_id),
        product_id: Set(product_id),
        credit_plan_id: Set(credit_plan_id),
        price: Set(price),
        is_active: Set(true),
        quantity: Set(quantity),
        ordered_quantity: Set(0),
        created_at: Set(now),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("insert catalog item");

    item_id
}

pub async fn seed_preorder(db: &DbPool, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    preorder::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        status: Set("OPEN".to_string()),
        expected_arrival: Set(Some("2026 Q4".to_string())),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("insert preorder");
    id
}

/// Self-pickup delivery body accepted by order creation.
pub fn pickup_delivery() -> Value {
    json!({
        "service": "SelfPickup",
        "address": "Store pickup point, Main st. 1"
    })
}

/// Mounts a successful `/Init` response on the gateway mock.
pub async fn mock_gateway_init_success(server: &MockServer, payment_id: i64) {
    Mock::given(method("POST"))
        .and(path("/Init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ErrorCode": "0",
            "TerminalKey": TERMINAL_KEY,
            "Status": "NEW",
            "PaymentId": payment_id,
            "OrderId": Uuid::new_v4(),
            "Amount": 0,
            "PaymentURL": format!("https://pay.example.com/{payment_id}")
        })))
        .mount(server)
        .await;
}

/// Mounts a gateway-level rejection (HTTP 200 with a non-zero error code).
pub async fn mock_gateway_init_rejection(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/Init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ErrorCode": "9999",
            "Message": "Terminal blocked"
        })))
        .mount(server)
        .await;
}

fn signing_token(fields: &[(&str, String)], password: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
    pairs.push(("Password", password));
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let concatenated: String = pairs.iter().map(|(_, v)| *v).collect();
    hex::encode(Sha256::digest(concatenated.as_bytes()))
}

/// Builds a correctly signed payment-status notification body.
pub fn signed_notification(invoice_id: Uuid, payment_id: i64, status: &str, amount: i64) -> Value {
    let fields = [
        ("TerminalKey", TERMINAL_KEY.to_string()),
        ("Amount", amount.to_string()),
        ("CardId", "742".to_string()),
        ("ErrorCode", "0".to_string()),
        ("ExpDate", "1230".to_string()),
        ("OrderId", invoice_id.to_string()),
        ("Pan", "430000******0777".to_string()),
        ("PaymentId", payment_id.to_string()),
        ("Status", status.to_string()),
        ("Success", "true".to_string()),
    ];
    let token = signing_token(&fields, GATEWAY_PASSWORD);

    json!({
        "TerminalKey": TERMINAL_KEY,
        "Amount": amount,
        "CardId": 742,
        "ErrorCode": "0",
        "ExpDate": "1230",
        "OrderId": invoice_id,
        "Pan": "430000******0777",
        "PaymentId": payment_id,
        "Status": status,
        "Success": true,
        "Token": token
    })
}
