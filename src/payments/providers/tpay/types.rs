//! Tpay OpenAPI request and response bodies

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    /// Echoed back as `tr_crc` on notifications
    pub hidden_description: String,
    pub payer: Payer,
    pub callbacks: Callbacks,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Payer {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Callbacks {
    pub payer_urls: PayerUrls,
    pub notification: NotificationCallback,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayerUrls {
    pub success: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationCallback {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RefundRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Transaction as returned by create and get calls
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub result: Option<String>,
    pub transaction_id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub transaction_payment_url: Option<String>,
}

/// Outcome of refund and cancel calls
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ActionResult {
    pub result: String,
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ErrorBody {
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .errors
            .iter()
            .filter_map(|e| match (&e.error_code, &e.error_message) {
                (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
                (None, Some(message)) => Some(message.clone()),
                (Some(code), None) => Some(code.clone()),
                (None, None) => None,
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}
