//! Tpay transaction notification verification
//!
//! Tpay posts a form with the transaction outcome and an `md5sum` field equal
//! to `md5(id + tr_id + tr_amount + tr_crc + security_code)`. Fields are
//! checked exactly as received, so the raw strings are kept unparsed here.
//! Request headers carry no signature and are not consulted.

use crate::payments::types::WebhookPayload;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Notification body is not a form or JSON object")]
    MalformedBody,

    #[error("Notification field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Notification checksum does not match")]
    ChecksumMismatch,

    #[error("Notification for merchant {received} does not belong to merchant {expected}")]
    MerchantMismatch { expected: String, received: String },
}

/// Fields of a Tpay notification relevant to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpayNotification {
    /// Merchant id
    pub id: String,
    pub tr_id: String,
    pub tr_amount: String,
    /// Hidden description set at creation, i.e. the host session id
    pub tr_crc: String,
    /// `TRUE`, `FALSE` or `CHARGEBACK`
    pub tr_status: String,
    pub tr_error: Option<String>,
    pub md5sum: String,
}

impl TpayNotification {
    /// Extract a notification from the parsed body, falling back to decoding
    /// the raw body as a form when the host did not parse it
    pub fn from_payload(payload: &WebhookPayload) -> Result<Self, NotificationError> {
        match &payload.data {
            Value::Object(fields) if !fields.is_empty() => Self::from_fields(fields),
            _ => {
                let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&payload.raw_data)
                    .map_err(|_| NotificationError::MalformedBody)?;
                let fields: Map<String, Value> = pairs
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                if fields.is_empty() {
                    return Err(NotificationError::MalformedBody);
                }
                Self::from_fields(&fields)
            }
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, NotificationError> {
        Ok(Self {
            id: required(fields, "id")?,
            tr_id: required(fields, "tr_id")?,
            tr_amount: required(fields, "tr_amount")?,
            tr_crc: required(fields, "tr_crc")?,
            tr_status: required(fields, "tr_status")?,
            tr_error: scalar(fields.get("tr_error")).filter(|e| e != "none"),
            md5sum: required(fields, "md5sum")?,
        })
    }

    pub fn expected_checksum(&self, security_code: &str) -> String {
        let signed = format!(
            "{}{}{}{}{}",
            self.id, self.tr_id, self.tr_amount, self.tr_crc, security_code
        );
        hex::encode(md5::compute(signed.as_bytes()).0)
    }
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string().to_uppercase()),
        _ => None,
    }
}

fn required(fields: &Map<String, Value>, name: &'static str) -> Result<String, NotificationError> {
    scalar(fields.get(name))
        .filter(|v| !v.is_empty())
        .ok_or(NotificationError::MissingField(name))
}

/// Checks notification authenticity with the merchant's security code
#[derive(Debug, Clone)]
pub struct NotificationVerifier {
    security_code: String,
    merchant_id: Option<String>,
}

impl NotificationVerifier {
    pub fn new(security_code: impl Into<String>, merchant_id: Option<String>) -> Self {
        Self {
            security_code: security_code.into(),
            merchant_id,
        }
    }

    pub fn verify(&self, payload: &WebhookPayload) -> Result<TpayNotification, NotificationError> {
        let notification = TpayNotification::from_payload(payload)?;

        if let Some(expected) = &self.merchant_id {
            if &notification.id != expected {
                return Err(NotificationError::MerchantMismatch {
                    expected: expected.clone(),
                    received: notification.id,
                });
            }
        }

        let computed = notification.expected_checksum(&self.security_code);
        if !constant_time_eq(&computed, notification.md5sum.trim()) {
            return Err(NotificationError::ChecksumMismatch);
        }

        Ok(notification)
    }
}

fn constant_time_eq(computed: &str, provided: &str) -> bool {
    if computed.len() != provided.len() {
        return false;
    }

    computed
        .as_bytes()
        .iter()
        .zip(provided.to_ascii_lowercase().as_bytes())
        .fold(0, |acc, (a, b)| acc | (a ^ b))
        == 0
}
