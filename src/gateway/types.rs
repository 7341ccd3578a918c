use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Computes the provider signing token: values of the scalar fields plus the
/// shared password, sorted alphabetically by field name and concatenated,
/// hashed with SHA-256. Nested objects (receipt, DATA) are excluded by the
/// provider's scheme; booleans serialize lowercase.
fn signing_token(fields: &[(&str, String)], password: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = fields
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .collect();
    pairs.push(("Password", password));
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let concatenated: String = pairs.iter().map(|(_, v)| *v).collect();
    hex::encode(Sha256::digest(concatenated.as_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

/// One fiscal receipt line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptItem {
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub quantity: i64,
    /// Line amount (`price * quantity`) in minor currency units.
    pub amount: i64,
    pub tax: String,
}

impl ReceiptItem {
    pub fn new(name: impl Into<String>, price: i64, quantity: i64) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
            amount: price * quantity,
            tax: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Receipt {
    pub email: String,
    pub phone: String,
    pub taxation: String,
    pub items: Vec<ReceiptItem>,
}

impl Receipt {
    pub fn new(email: impl Into<String>, phone: impl Into<String>, items: Vec<ReceiptItem>) -> Self {
        Self {
            email: email.into(),
            phone: phone.into(),
            taxation: "usn_income_outcome".to_string(),
            items,
        }
    }
}

/// Outbound payment-initiation request. `terminal_key`, `notification_url`
/// and `token` are filled in by the client before sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitPaymentRequest {
    #[serde(default)]
    pub terminal_key: String,
    pub amount: i64,
    /// Provider-side order reference; we pass the initial invoice id.
    pub order_id: Uuid,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Deadline for the customer to complete the redirect payment form.
    pub redirect_due_date: String,
    #[serde(rename = "NotificationURL", default)]
    pub notification_url: String,
    #[serde(rename = "DATA")]
    pub data: HashMap<String, String>,
    pub receipt: Receipt,
}

impl InitPaymentRequest {
    pub fn new(
        amount: i64,
        order_id: Uuid,
        description: String,
        redirect_due_date: DateTime<Utc>,
        data: HashMap<String, String>,
        receipt: Receipt,
    ) -> Self {
        Self {
            terminal_key: String::new(),
            amount,
            order_id,
            description,
            token: None,
            redirect_due_date: redirect_due_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            notification_url: String::new(),
            data,
            receipt,
        }
    }

    pub(crate) fn signing_token(&self, password: &str) -> String {
        signing_token(
            &[
                ("TerminalKey", self.terminal_key.clone()),
                ("Amount", self.amount.to_string()),
                ("OrderId", self.order_id.to_string()),
                ("Description", self.description.clone()),
                ("RedirectDueDate", self.redirect_due_date.clone()),
                ("NotificationURL", self.notification_url.clone()),
            ],
            password,
        )
    }
}

/// Provider response to `/Init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitPaymentResponse {
    pub terminal_key: String,
    pub status: String,
    pub payment_id: i64,
    pub order_id: Uuid,
    pub amount: i64,
    #[serde(rename = "PaymentURL")]
    pub payment_url: String,
}

/// Inbound payment-status webhook body. `order_id` carries the invoice id we
/// handed to the provider at init time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentStatusNotification {
    pub terminal_key: String,
    pub amount: i64,
    pub card_id: i64,
    pub error_code: String,
    pub exp_date: String,
    #[serde(rename = "OrderId")]
    pub invoice_id: Uuid,
    pub pan: String,
    pub payment_id: i64,
    pub status: String,
    pub success: bool,
    pub token: String,
}

impl PaymentStatusNotification {
    /// Recomputes the signing token over the notification fields (token
    /// excluded) and compares it to the carried one in constant time.
    pub fn verify(&self, password: &str) -> bool {
        constant_time_eq(&self.token, &self.expected_token(password))
    }

    pub(crate) fn expected_token(&self, password: &str) -> String {
        signing_token(
            &[
                ("TerminalKey", self.terminal_key.clone()),
                ("Amount", self.amount.to_string()),
                ("CardId", self.card_id.to_string()),
                ("ErrorCode", self.error_code.clone()),
                ("ExpDate", self.exp_date.clone()),
                ("OrderId", self.invoice_id.to_string()),
                ("Pan", self.pan.clone()),
                ("PaymentId", self.payment_id.to_string()),
                ("Status", self.status.clone()),
                ("Success", self.success.to_string()),
            ],
            password,
        )
    }
}
