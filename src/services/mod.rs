//! Service layer: business logic between the HTTP handlers and the store.

pub mod catalog;
pub mod checkout_session;
pub mod invoicing;
pub mod orders;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::gateway::PaymentGatewayClient;

use catalog::CatalogService;
use checkout_session::CheckoutSessionStore;
use orders::OrderService;

/// All services, wired once at startup and shared through the app state.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub orders: Arc<OrderService>,
    pub checkout_sessions: Arc<CheckoutSessionStore>,
}

impl AppServices {
    pub fn build(
        db: Arc<DbPool>,
        gateway: Arc<PaymentGatewayClient>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(
                db.clone(),
                event_sender.clone(),
                config.checkout.max_cart_item_quantity,
            )),
            orders: Arc::new(OrderService::new(
                db,
                gateway,
                event_sender,
                config.checkout.order_expiry_hours,
            )),
            checkout_sessions: Arc::new(CheckoutSessionStore::new(
                config.checkout.session_ttl_minutes,
            )),
        }
    }
}
