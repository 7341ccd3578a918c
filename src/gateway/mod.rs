//! Payment gateway adapter.
//!
//! Wire contract (HTTP/JSON, PascalCase fields): an outbound `/Init` request
//! signed with a SHA-256 token over the alphabetically sorted scalar fields
//! plus the shared password, and an inbound payment-status notification
//! verified with the same scheme. Amounts are integer minor currency units.

mod types;

pub use types::{
    InitPaymentRequest, InitPaymentResponse, PaymentStatusNotification, Receipt, ReceiptItem,
};

use reqwest::Client;
use std::time::Duration;
use tracing::{error, instrument};

use crate::config::GatewayConfig;
use crate::errors::ServiceError;

/// HTTP client for the external payment provider.
#[derive(Clone)]
pub struct PaymentGatewayClient {
    http: Client,
    base_url: String,
    terminal_key: String,
    password: String,
    notification_url: String,
}

impl PaymentGatewayClient {
    pub fn new(cfg: &GatewayConfig) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("gateway client init: {e}")))?;

        Ok(Self {
            http,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            terminal_key: cfg.terminal_key.clone(),
            password: cfg.password.clone(),
            notification_url: cfg.notification_url.clone(),
        })
    }

    /// Initiates a payment. Signs the request, POSTs `/Init` and parses the
    /// provider response. Transport failures, timeouts and non-zero
    /// application error codes all surface as [`ServiceError::PaymentGateway`].
    #[instrument(skip(self, request), fields(order_id = %request.order_id, amount = request.amount))]
    pub async fn init_payment(
        &self,
        mut request: InitPaymentRequest,
    ) -> Result<InitPaymentResponse, ServiceError> {
        request.terminal_key = self.terminal_key.clone();
        request.notification_url = self.notification_url.clone();
        request.token = Some(request.signing_token(&self.password));

        let response = self
            .http
            .post(format!("{}/Init", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::PaymentGateway(format!("init request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::PaymentGateway(format!(
                "init returned HTTP {status}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentGateway(format!("malformed init response: {e}")))?;

        let error_code = body.get("ErrorCode").and_then(|v| v.as_str()).unwrap_or("");
        if error_code != "0" {
            error!(?body, "payment init rejected by gateway");
            let details = body
                .get("Details")
                .or_else(|| body.get("Message"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown gateway error");
            return Err(ServiceError::PaymentGateway(format!(
                "init rejected (code {error_code}): {details}"
            )));
        }

        serde_json::from_value(body)
            .map_err(|e| ServiceError::PaymentGateway(format!("malformed init response: {e}")))
    }

    /// Verifies an inbound payment-status notification against the shared
    /// password. Does not touch any state.
    pub fn verify_notification(
        &self,
        notification: &PaymentStatusNotification,
    ) -> Result<(), ServiceError> {
        if notification.verify(&self.password) {
            Ok(())
        } else {
            Err(ServiceError::InvalidSignature)
        }
    }
}
