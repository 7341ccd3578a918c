use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderResponse, DeliveryRequest, OrderView};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Ids of checkout items the customer chose to pay in installments.
    #[serde(default)]
    pub credit_item_ids: Vec<Uuid>,
    pub delivery: Option<DeliveryRequest>,
}

/// Creates an order from the caller's verified checkout session.
///
/// Consumes the session, reserves stock and initiates the gateway payment
/// for the initial invoice. Reservation failure aborts before anything is
/// persisted; a gateway failure after that leaves the unpaid order in place.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created, payment initiated", body = CreateOrderResponse),
        (status = 400, description = "No verified checkout data", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock ran out since verification", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment gateway unavailable", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ServiceError> {
    // Atomic consume: a double-submitted order must not spend the same
    // verified session twice.
    let items = state
        .services
        .checkout_sessions
        .take(user.id)
        .ok_or_else(|| {
            ServiceError::InvalidCheckoutData("no verified checkout data for user".to_string())
        })?;

    // Reject bad input before touching stock: a failure past this point
    // would leave the reservation in place.
    if items.first().map_or(true, |item| item.preorder_id.is_none())
        && request.delivery.is_none()
    {
        return Err(ServiceError::InvalidCheckoutData(
            "delivery data is required for in-stock orders".to_string(),
        ));
    }
    if let Some(delivery) = &request.delivery {
        delivery.validate()?;
    }

    let quantities: HashMap<Uuid, i64> =
        items.iter().map(|item| (item.id, item.quantity)).collect();
    state.services.catalog.reserve_items(&quantities).await?;

    let response = state
        .services
        .orders
        .create_order(&user, items, request.credit_item_ids, request.delivery)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Returns the caller's order with items, invoices, installment progress and
/// delivery tracking.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order details", body = OrderView),
        (status = 403, description = "Order belongs to another user", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, ServiceError> {
    let view = state.services.orders.get_user_order(id, user.id).await?;
    Ok(Json(view))
}
