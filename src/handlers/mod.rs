//! HTTP handlers. Thin: parse and authenticate, call a service, shape the
//! response. Everything interesting lives in `crate::services`.

pub mod checkout;
pub mod health;
pub mod orders;
pub mod webhooks;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout",
            post(checkout::verify_checkout).get(checkout::get_checkout),
        )
        .route("/orders", post(orders::create_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/webhooks/payment-status", post(webhooks::payment_status))
}
