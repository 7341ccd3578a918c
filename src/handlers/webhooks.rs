use axum::{extract::State, Json};
use tracing::info;

use crate::errors::ServiceError;
use crate::gateway::PaymentStatusNotification;
use crate::AppState;

/// Receives a payment-status notification from the gateway.
///
/// The signature is checked before any state is touched; a valid
/// notification is applied idempotently. The gateway expects a literal `OK`
/// body, anything else makes it redeliver.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payment-status",
    request_body = PaymentStatusNotification,
    responses(
        (status = 200, description = "Notification applied", body = String),
        (status = 401, description = "Signature verification failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown invoice", body = crate::errors::ErrorResponse),
    ),
    tag = "webhooks"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    Json(notification): Json<PaymentStatusNotification>,
) -> Result<&'static str, ServiceError> {
    state.gateway.verify_notification(&notification)?;

    info!(
        invoice_id = %notification.invoice_id,
        status = %notification.status,
        "payment notification received"
    );
    state
        .services
        .orders
        .apply_payment_notification(&notification)
        .await?;

    Ok("OK")
}
