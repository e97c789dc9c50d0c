//! Host-facing payment types
//!
//! Request and response shapes exchanged between the host framework and a
//! payment provider. Provider-specific session data travels in the opaque
//! `data` field and is handed back unchanged on later lifecycle calls.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Payment session status as understood by the host
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSessionStatus {
    Authorized,
    Captured,
    Canceled,
    Pending,
    RequiresMore,
    Error,
}

/// Input for starting a payment session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentInput {
    /// Amount in major currency units (e.g. 12.50 PLN)
    pub amount: Decimal,
    /// ISO currency code as sent by the host (any case)
    pub currency_code: String,
    /// Provider-specific initiation data
    pub data: Option<Value>,
}

/// Result of starting a payment session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitiatePaymentOutput {
    /// Gateway transaction identifier
    pub id: String,
    /// Session data the host stores and passes back on later calls
    pub data: Value,
    pub status: PaymentSessionStatus,
}

/// Input shared by the operations that only carry stored session data
/// (authorize, capture, cancel, retrieve, delete, status check)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDataInput {
    pub data: Option<Value>,
}

impl PaymentDataInput {
    pub fn new(data: Value) -> Self {
        Self { data: Some(data) }
    }
}

/// Output of the operations that echo session data back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentDataOutput {
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizePaymentOutput {
    pub data: Option<Value>,
    pub status: PaymentSessionStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentStatusOutput {
    pub status: PaymentSessionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundPaymentInput {
    /// Amount to refund in major currency units
    pub amount: Decimal,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePaymentInput {
    pub amount: Decimal,
    pub currency_code: String,
    pub data: Option<Value>,
}

/// Raw inbound webhook as received by the endpoint
#[derive(Debug, Clone, Default)]
pub struct WebhookPayload {
    /// Parsed body (JSON object or form fields)
    pub data: Value,
    /// Unparsed request body
    pub raw_data: Vec<u8>,
    /// Request headers, lower-cased names. Tpay signs the body only, so the
    /// Tpay verifier does not read them; other providers on the same host
    /// contract may.
    pub headers: HashMap<String, String>,
}

/// Normalized webhook action consumed by the host workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    Authorized,
    Captured,
    Canceled,
    Pending,
    NotSupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookActionData {
    pub session_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookActionResult {
    pub action: WebhookAction,
    pub data: Option<WebhookActionData>,
}

impl WebhookActionResult {
    /// Whether the host workflow has anything to act on
    pub fn is_actionable(&self) -> bool {
        self.action != WebhookAction::NotSupported && self.data.is_some()
    }
}
