//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::entities::delivery::DeliveryService;
use crate::entities::invoice::{InvoiceStatus, InvoiceType};
use crate::entities::order::OrderStatus;
use crate::errors::ErrorResponse;
use crate::gateway::PaymentStatusNotification;
use crate::handlers;
use crate::handlers::checkout::{
    StoredCheckoutResponse, VerifyCheckoutRequest, VerifyCheckoutResponse,
};
use crate::handlers::health::HealthResponse;
use crate::handlers::orders::CreateOrderRequest;
use crate::services::catalog::{
    AdjustedCheckoutItem, AvailableCheckoutItem, CheckoutItemRequest, CreditPaymentPart,
};
use crate::services::orders::{
    CreateOrderResponse, DeliveryRequest, DeliveryView, InstallmentView, InvoiceView,
    OrderItemView, OrderView, PreorderView,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::checkout::verify_checkout,
        handlers::checkout::get_checkout,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::webhooks::payment_status,
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        CheckoutItemRequest,
        CreditPaymentPart,
        AvailableCheckoutItem,
        AdjustedCheckoutItem,
        VerifyCheckoutRequest,
        VerifyCheckoutResponse,
        StoredCheckoutResponse,
        CreateOrderRequest,
        DeliveryRequest,
        DeliveryService,
        CreateOrderResponse,
        OrderView,
        OrderItemView,
        OrderStatus,
        InvoiceView,
        InvoiceType,
        InvoiceStatus,
        InstallmentView,
        DeliveryView,
        PreorderView,
        PaymentStatusNotification,
    )),
    tags(
        (name = "checkout", description = "Cart verification"),
        (name = "orders", description = "Order creation and lookup"),
        (name = "webhooks", description = "Payment gateway callbacks"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "Storefront API",
        description = "Checkout, ordering and payment reconciliation for the storefront"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_includes_all_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/checkout"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/orders"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/orders/{id}"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/webhooks/payment-status"));
    }
}
