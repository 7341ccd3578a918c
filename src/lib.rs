//! Storefront backend: checkout verification, stock reservation, order and
//! invoice management, and payment-gateway reconciliation.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::gateway::PaymentGatewayClient;
use crate::services::AppServices;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<PaymentGatewayClient>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: Arc<AppConfig>,
        gateway: Arc<PaymentGatewayClient>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        let services = AppServices::build(db.clone(), gateway.clone(), event_sender, &config);
        Self {
            db,
            config,
            gateway,
            services,
        }
    }
}

/// Builds the full application router: versioned API, health probe, API docs
/// and the middleware stack.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", handlers::api_router())
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
