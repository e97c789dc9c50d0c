//! Provider options validation
//!
//! Raw configuration arrives as an untyped object (host config file or
//! `TPAY_*` environment variables). [`TpayOptions::parse`] checks every field
//! and reports all problems at once so a misconfigured deployment fails at
//! startup with the full list instead of one error per restart.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

pub const TPAY_PRODUCTION_URL: &str = "https://api.tpay.com";
pub const TPAY_SANDBOX_URL: &str = "https://openapi.sandbox.tpay.com";

/// Host action reported for a notification that marks the transaction paid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidAction {
    /// Paid means authorized; the host captures afterwards
    #[default]
    Authorized,
    /// Paid means settled; the host marks the payment captured directly
    Captured,
}

impl PaidAction {
    const ALLOWED: &'static [&'static str] = &["authorized", "captured"];

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "authorized" => Some(Self::Authorized),
            "captured" => Some(Self::Captured),
            _ => None,
        }
    }
}

/// Validated Tpay provider options, immutable after construction
#[derive(Debug, Clone, PartialEq)]
pub struct TpayOptions {
    pub client_id: String,
    pub client_secret: String,
    pub sandbox: bool,
    pub return_url: Url,
    /// Falls back to `return_url` when not configured
    pub failure_url: Url,
    pub callback_url: Url,
    pub title: Option<String>,
    pub refund_description: Option<String>,
    /// Merchant notification security code; `client_secret` is used when absent
    pub security_code: Option<String>,
    /// Expected merchant id on notifications
    pub merchant_id: Option<String>,
    pub paid_action: PaidAction,
    pub api_base_url: Option<Url>,
}

impl TpayOptions {
    /// Validate a raw options object
    pub fn parse(raw: &Value) -> Result<Self, OptionsError> {
        let Some(map) = raw.as_object() else {
            return Err(OptionsError {
                issues: vec![OptionIssue::new(
                    "options",
                    IssueKind::WrongType { expected: "object" },
                )],
            });
        };

        let mut reader = FieldReader::new(map);

        let client_id = reader.scalar_string("client_id", true);
        let client_secret = reader.scalar_string("client_secret", true);
        let sandbox = reader.boolean("sandbox").unwrap_or(true);
        let return_url = reader.url("return_url", true);
        let failure_url = reader.url("failure_url", false);
        let callback_url = reader.url("callback_url", true);
        let title = reader.string("title", false);
        let refund_description = reader.string("refund_description", false);
        let security_code = reader.scalar_string("security_code", false);
        let merchant_id = reader.scalar_string("merchant_id", false);
        let paid_action = reader.paid_action("paid_action").unwrap_or_default();
        let api_base_url = reader.url("api_base_url", false);

        if !reader.issues.is_empty() {
            return Err(OptionsError {
                issues: reader.issues,
            });
        }

        match (client_id, client_secret, return_url, callback_url) {
            (Some(client_id), Some(client_secret), Some(return_url), Some(callback_url)) => {
                Ok(Self {
                    client_id,
                    client_secret,
                    sandbox,
                    failure_url: failure_url.unwrap_or_else(|| return_url.clone()),
                    return_url,
                    callback_url,
                    title,
                    refund_description,
                    security_code,
                    merchant_id,
                    paid_action,
                    api_base_url,
                })
            }
            // every required field either produced a value or an issue
            _ => Err(OptionsError { issues: Vec::new() }),
        }
    }

    /// Load options from `TPAY_*` environment variables
    ///
    /// `TPAY_CLIENT_ID` maps to `client_id`, `TPAY_RETURN_URL` to
    /// `return_url`, and so on. Values stay strings so credentials such as
    /// `007123` keep their leading zeros.
    pub fn from_env() -> Result<Self, ProviderError> {
        let raw = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix("TPAY"))
            .build()
            .and_then(|c| c.try_deserialize::<Value>())
            .map_err(|e| {
                OptionsError::from(OptionIssue::new(
                    "options",
                    IssueKind::Unreadable {
                        reason: e.to_string(),
                    },
                ))
            })?;

        Ok(Self::parse(&raw)?)
    }

    /// Base URL of the Tpay OpenAPI for this configuration
    pub fn api_base_url(&self) -> &str {
        match &self.api_base_url {
            Some(url) => url.as_str().trim_end_matches('/'),
            None if self.sandbox => TPAY_SANDBOX_URL,
            None => TPAY_PRODUCTION_URL,
        }
    }

    /// Secret used to verify notification checksums
    pub fn security_code(&self) -> &str {
        self.security_code.as_deref().unwrap_or(&self.client_secret)
    }

    /// Whether notifications are checked against `client_secret`
    pub fn uses_client_secret_for_notifications(&self) -> bool {
        self.security_code.is_none()
    }
}

/// What is wrong with a single option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    Missing,
    Empty,
    WrongType { expected: &'static str },
    InvalidUrl { reason: String },
    UnknownValue { allowed: &'static [&'static str] },
    Unreadable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionIssue {
    pub field: &'static str,
    pub kind: IssueKind,
}

impl OptionIssue {
    fn new(field: &'static str, kind: IssueKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for OptionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Missing => write!(f, "{} is required", self.field),
            IssueKind::Empty => write!(f, "{} cannot be empty", self.field),
            IssueKind::WrongType { expected } => {
                write!(f, "{} must be a {}", self.field, expected)
            }
            IssueKind::InvalidUrl { reason } => {
                write!(f, "{} is not a valid URL: {}", self.field, reason)
            }
            IssueKind::UnknownValue { allowed } => {
                write!(f, "{} must be one of: {}", self.field, allowed.join(", "))
            }
            IssueKind::Unreadable { reason } => {
                write!(f, "{} could not be read: {}", self.field, reason)
            }
        }
    }
}

/// Every problem found in a raw options object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsError {
    pub issues: Vec<OptionIssue>,
}

impl OptionsError {
    pub fn has_issue(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl From<OptionIssue> for OptionsError {
    fn from(issue: OptionIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "invalid options");
        }
        let issues: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", issues.join("; "))
    }
}

impl std::error::Error for OptionsError {}

struct FieldReader<'a> {
    raw: &'a Map<String, Value>,
    issues: Vec<OptionIssue>,
}

impl<'a> FieldReader<'a> {
    fn new(raw: &'a Map<String, Value>) -> Self {
        Self {
            raw,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, field: &'static str, kind: IssueKind) {
        self.issues.push(OptionIssue::new(field, kind));
    }

    fn present(&mut self, field: &'static str, required: bool) -> Option<&'a Value> {
        let raw = self.raw;
        match raw.get(field) {
            Some(Value::Null) | None => {
                if required {
                    self.issue(field, IssueKind::Missing);
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    fn non_empty(&mut self, field: &'static str, value: String) -> Option<String> {
        if value.trim().is_empty() {
            self.issue(field, IssueKind::Empty);
            return None;
        }
        Some(value)
    }

    fn string(&mut self, field: &'static str, required: bool) -> Option<String> {
        match self.present(field, required)? {
            Value::String(s) => self.non_empty(field, s.clone()),
            _ => {
                self.issue(field, IssueKind::WrongType { expected: "string" });
                None
            }
        }
    }

    /// Credentials and ids may be configured as numbers
    fn scalar_string(&mut self, field: &'static str, required: bool) -> Option<String> {
        match self.present(field, required)? {
            Value::String(s) => self.non_empty(field, s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.issue(
                    field,
                    IssueKind::WrongType {
                        expected: "string or number",
                    },
                );
                None
            }
        }
    }

    /// Environment sources deliver flags as `"true"` / `"false"`
    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        match self.present(field, false)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => {
                self.issue(field, IssueKind::WrongType { expected: "boolean" });
                None
            }
        }
    }

    fn url(&mut self, field: &'static str, required: bool) -> Option<Url> {
        let raw = self.string(field, required)?;
        match Url::parse(&raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            Ok(url) => {
                self.issue(
                    field,
                    IssueKind::InvalidUrl {
                        reason: format!("unsupported scheme '{}'", url.scheme()),
                    },
                );
                None
            }
            Err(e) => {
                self.issue(
                    field,
                    IssueKind::InvalidUrl {
                        reason: e.to_string(),
                    },
                );
                None
            }
        }
    }

    fn paid_action(&mut self, field: &'static str) -> Option<PaidAction> {
        let name = self.string(field, false)?;
        let action = PaidAction::from_name(&name.to_lowercase());
        if action.is_none() {
            self.issue(
                field,
                IssueKind::UnknownValue {
                    allowed: PaidAction::ALLOWED,
                },
            );
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    // from_env tests share the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "TPAY_CLIENT_ID",
        "TPAY_CLIENT_SECRET",
        "TPAY_SANDBOX",
        "TPAY_RETURN_URL",
        "TPAY_CALLBACK_URL",
        "TPAY_TITLE",
        "TPAY_SECURITY_CODE",
        "TPAY_MERCHANT_ID",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn valid_raw() -> Value {
        json!({
            "client_id": "01HQ-client",
            "client_secret": "secret",
            "return_url": "https://shop.example.com/checkout/done",
            "callback_url": "https://shop.example.com/hooks/payment/tpay",
        })
    }

    #[test]
    fn test_defaults_applied() {
        let options = TpayOptions::parse(&valid_raw()).unwrap();
        assert!(options.sandbox);
        assert_eq!(options.failure_url, options.return_url);
        assert_eq!(options.paid_action, PaidAction::Authorized);
        assert_eq!(options.api_base_url(), TPAY_SANDBOX_URL);
        assert_eq!(options.security_code(), "secret");
        assert!(options.uses_client_secret_for_notifications());
    }

    #[test]
    fn test_explicit_failure_url_kept() {
        let mut raw = valid_raw();
        raw["failure_url"] = json!("https://shop.example.com/checkout/failed");
        raw["sandbox"] = json!(false);

        let options = TpayOptions::parse(&raw).unwrap();
        assert_eq!(
            options.failure_url.as_str(),
            "https://shop.example.com/checkout/failed"
        );
        assert_eq!(options.api_base_url(), TPAY_PRODUCTION_URL);
    }

    #[test]
    fn test_numeric_client_id_accepted() {
        let mut raw = valid_raw();
        raw["client_id"] = json!(1010);
        raw["merchant_id"] = json!(1010);

        let options = TpayOptions::parse(&raw).unwrap();
        assert_eq!(options.client_id, "1010");
        assert_eq!(options.merchant_id.as_deref(), Some("1010"));
    }

    #[test]
    fn test_every_malformed_field_reported() {
        let raw = json!({
            "client_secret": true,
            "sandbox": "yes",
            "return_url": "not a url",
            "callback_url": "ftp://shop.example.com/hook",
            "paid_action": "settled",
        });

        let err = TpayOptions::parse(&raw).unwrap_err();
        assert_eq!(err.issues.len(), 6);
        assert!(err.has_issue("client_id"));
        assert!(err.has_issue("client_secret"));
        assert!(err.has_issue("sandbox"));
        assert!(err.has_issue("return_url"));
        assert!(err.has_issue("callback_url"));
        assert!(err.has_issue("paid_action"));
        assert!(err.to_string().contains("client_id is required"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut raw = valid_raw();
        raw["client_secret"] = json!("  ");

        let err = TpayOptions::parse(&raw).unwrap_err();
        assert_eq!(
            err.issues,
            vec![OptionIssue::new("client_secret", IssueKind::Empty)]
        );
    }

    #[test]
    fn test_non_object_rejected() {
        let err = TpayOptions::parse(&json!("client_id=1")).unwrap_err();
        assert!(err.has_issue("options"));
    }

    #[test]
    fn test_from_env_missing_credentials() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let options = TpayOptions::from_env();
        assert!(options.is_err(), "Options should fail without credentials");
    }

    #[test]
    fn test_from_env_keeps_numeric_looking_strings() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        std::env::set_var("TPAY_CLIENT_ID", "01HQ-client");
        std::env::set_var("TPAY_CLIENT_SECRET", "secret");
        std::env::set_var("TPAY_SANDBOX", "false");
        std::env::set_var("TPAY_RETURN_URL", "https://shop.example.com/checkout/done");
        std::env::set_var("TPAY_CALLBACK_URL", "https://shop.example.com/hooks/payment/tpay");
        std::env::set_var("TPAY_TITLE", "2024");
        std::env::set_var("TPAY_SECURITY_CODE", "007123");
        std::env::set_var("TPAY_MERCHANT_ID", "01010");

        let result = TpayOptions::from_env();
        clear_env();

        let options = result.unwrap();
        assert!(!options.sandbox);
        assert_eq!(options.title.as_deref(), Some("2024"));
        assert_eq!(options.security_code.as_deref(), Some("007123"));
        assert_eq!(options.security_code(), "007123");
        assert_eq!(options.merchant_id.as_deref(), Some("01010"));
        assert!(!options.uses_client_secret_for_notifications());
    }

    #[test]
    fn test_boolean_accepts_flag_strings() {
        let mut raw = valid_raw();
        raw["sandbox"] = json!("FALSE");
        assert!(!TpayOptions::parse(&raw).unwrap().sandbox);

        raw["sandbox"] = json!("true");
        assert!(TpayOptions::parse(&raw).unwrap().sandbox);

        raw["sandbox"] = json!("1");
        assert!(TpayOptions::parse(&raw).unwrap_err().has_issue("sandbox"));
    }

    #[test]
    fn test_api_base_url_override() {
        let mut raw = valid_raw();
        raw["api_base_url"] = json!("http://127.0.0.1:9000/");
        raw["paid_action"] = json!("captured");

        let options = TpayOptions::parse(&raw).unwrap();
        assert_eq!(options.api_base_url(), "http://127.0.0.1:9000");
        assert_eq!(options.paid_action, PaidAction::Captured);
    }
}
