use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::services::catalog::{
    AdjustedCheckoutItem, AvailableCheckoutItem, CheckoutItemRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyCheckoutRequest {
    pub items: Vec<CheckoutItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyCheckoutResponse {
    /// True when every line is fulfillable as requested; only then is the
    /// checkout stored for order creation.
    pub ready: bool,
    pub available_items: Vec<AvailableCheckoutItem>,
    pub adjusted_items: Vec<AdjustedCheckoutItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoredCheckoutResponse {
    pub items: Vec<AvailableCheckoutItem>,
}

/// Verifies cart contents against the catalog. When the store can fulfill
/// every line, the confirmed lines are kept for the subsequent order
/// creation call; adjusted carts must be re-verified.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = VerifyCheckoutRequest,
    responses(
        (status = 200, description = "Checkout data verified", body = VerifyCheckoutResponse),
        (status = 400, description = "Empty cart, bad quantities or mixed sections", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown or inactive item", body = crate::errors::ErrorResponse),
    ),
    tag = "checkout"
)]
pub async fn verify_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<VerifyCheckoutRequest>,
) -> Result<Json<VerifyCheckoutResponse>, ServiceError> {
    let data = state.services.catalog.verify_checkout(&request.items).await?;

    let ready = data.adjusted_items.is_empty();
    if ready {
        state
            .services
            .checkout_sessions
            .put(user.id, data.available_items.clone());
    }

    Ok(Json(VerifyCheckoutResponse {
        ready,
        available_items: data.available_items,
        adjusted_items: data.adjusted_items,
    }))
}

/// Returns the caller's stored checkout data, if a fresh session exists.
#[utoipa::path(
    get,
    path = "/api/v1/checkout",
    responses(
        (status = 200, description = "Stored checkout data", body = StoredCheckoutResponse),
        (status = 400, description = "No fresh checkout session", body = crate::errors::ErrorResponse),
    ),
    tag = "checkout"
)]
pub async fn get_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<StoredCheckoutResponse>, ServiceError> {
    let items = state
        .services
        .checkout_sessions
        .get(user.id)
        .ok_or(ServiceError::CheckoutDataEmpty)?;
    Ok(Json(StoredCheckoutResponse { items }))
}
