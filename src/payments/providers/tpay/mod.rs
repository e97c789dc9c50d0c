//! Tpay payment provider implementation
//!
//! Maps each host lifecycle operation onto a single Tpay call and translates
//! Tpay statuses into host statuses. Payments in PLN only.

pub mod client;
pub mod notification;
pub mod status;
pub mod types;

use crate::error::{ProviderError, ProviderResult};
use crate::payments::options::{OptionsError, TpayOptions};
use crate::payments::traits::PaymentProvider;
use crate::payments::types::{
    AuthorizePaymentOutput, InitiatePaymentInput, InitiatePaymentOutput, PaymentDataInput,
    PaymentDataOutput, PaymentStatusOutput, RefundPaymentInput, UpdatePaymentInput,
    WebhookActionData, WebhookActionResult, WebhookPayload,
};
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use client::{GatewayError, TpayClient, TransactionGateway};
use types::{Callbacks, CreateTransactionRequest, NotificationCallback, Payer, PayerUrls, RefundRequest};

pub const TPAY_IDENTIFIER: &str = "tpay";

pub const SUPPORTED_CURRENCIES: &[&str] = &["PLN"];

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Session data stored by the host between lifecycle calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TpayPaymentData {
    pub session_id: String,
    pub amount: Decimal,
    pub currency: String,
    /// Tpay transaction title
    pub tx_id: String,
    /// Where the payer completes the payment
    pub url: String,
}

/// Data the host supplies when starting a session
#[derive(Debug, Clone, Deserialize)]
struct InitiationData {
    session_id: String,
    customer_name: String,
    email: String,
}

impl InitiationData {
    fn parse(data: Option<&Value>) -> ProviderResult<Self> {
        let data = data.ok_or_else(|| {
            ProviderError::invalid_data("Missing initiation data for Tpay payment.")
        })?;

        let parsed: Self = serde_json::from_value(data.clone()).map_err(|e| {
            ProviderError::invalid_data(format!("Invalid initiation data for Tpay payment: {}", e))
        })?;

        if parsed.session_id.trim().is_empty() {
            return Err(ProviderError::invalid_data(
                "Initiation data is missing session_id.",
            ));
        }
        if !looks_like_email(&parsed.email) {
            return Err(ProviderError::invalid_data(format!(
                "Invalid payer email address: {}",
                parsed.email
            )));
        }

        Ok(parsed)
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Read stored session data, rejecting anything without a session id
fn payment_data(data: Option<&Value>, operation: &str) -> ProviderResult<TpayPaymentData> {
    let invalid = || {
        ProviderError::invalid_data(format!(
            "Missing or invalid payment data for Tpay payment {}.",
            operation
        ))
    };

    let data = match data {
        Some(Value::Object(map)) => map,
        _ => return Err(invalid()),
    };

    match data.get("session_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => {}
        _ => return Err(invalid()),
    }

    serde_json::from_value(Value::Object(data.clone())).map_err(|e| {
        warn!("Unreadable Tpay payment data for {}: {}", operation, e);
        invalid()
    })
}

/// Tpay payment provider
pub struct TpayProvider<G: TransactionGateway = TpayClient> {
    options: TpayOptions,
    gateway: G,
}

impl TpayProvider<TpayClient> {
    /// Create a provider talking to Tpay over HTTP
    pub fn from_options(options: TpayOptions, request_timeout: Duration) -> ProviderResult<Self> {
        let client = TpayClient::new(&options, request_timeout)?;
        Ok(Self::new(options, client))
    }

    /// Create provider from `TPAY_*` environment variables
    pub fn from_env() -> ProviderResult<Self> {
        let options = TpayOptions::from_env()?;
        let timeout_secs = std::env::var("TPAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::from_options(options, Duration::from_secs(timeout_secs))
    }
}

impl<G: TransactionGateway> TpayProvider<G> {
    pub fn new(options: TpayOptions, gateway: G) -> Self {
        Self { options, gateway }
    }

    /// Check raw options without building a provider
    pub fn validate_options(raw: &Value) -> Result<(), OptionsError> {
        TpayOptions::parse(raw).map(|_| ())
    }

    pub fn options(&self) -> &TpayOptions {
        &self.options
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

#[async_trait]
impl<G: TransactionGateway> PaymentProvider for TpayProvider<G> {
    fn identifier(&self) -> &'static str {
        TPAY_IDENTIFIER
    }

    async fn initiate_payment(
        &self,
        input: InitiatePaymentInput,
    ) -> ProviderResult<InitiatePaymentOutput> {
        let data = InitiationData::parse(input.data.as_ref())?;
        let currency = input.currency_code.to_uppercase();

        if !SUPPORTED_CURRENCIES.contains(&currency.as_str()) {
            return Err(ProviderError::not_allowed(format!(
                "Currency {} is not supported by Tpay payment provider. Supported currencies are: {}",
                input.currency_code,
                SUPPORTED_CURRENCIES.join(", ")
            )));
        }

        info!(
            "Initiating Tpay payment: {} {} session={}",
            input.amount, currency, data.session_id
        );

        let request = CreateTransactionRequest {
            amount: input
                .amount
                .round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity),
            currency,
            description: self
                .options
                .title
                .clone()
                .unwrap_or_else(|| format!("Payment {}", data.session_id)),
            hidden_description: data.session_id.clone(),
            payer: Payer {
                email: data.email,
                name: data.customer_name,
            },
            callbacks: Callbacks {
                payer_urls: PayerUrls {
                    success: self.options.return_url.to_string(),
                    error: self.options.failure_url.to_string(),
                },
                notification: NotificationCallback {
                    url: self.options.callback_url.to_string(),
                },
            },
        };

        let transaction = self.gateway.create_transaction(&request).await?;

        info!(
            "Tpay transaction created: title={}, status={}",
            transaction.title, transaction.status
        );

        let payment_data = TpayPaymentData {
            session_id: data.session_id,
            amount: input.amount,
            currency: input.currency_code,
            tx_id: transaction.title.clone(),
            url: transaction.transaction_payment_url.unwrap_or_default(),
        };

        let data = serde_json::to_value(&payment_data).map_err(|e| {
            ProviderError::unexpected_state(format!("Failed to serialize payment data: {}", e))
        })?;

        Ok(InitiatePaymentOutput {
            id: transaction.title,
            data,
            status: status::session_status(&transaction.status),
        })
    }

    async fn authorize_payment(
        &self,
        input: PaymentDataInput,
    ) -> ProviderResult<AuthorizePaymentOutput> {
        let result = self.get_payment_status(input.clone()).await?;

        Ok(AuthorizePaymentOutput {
            data: input.data,
            status: result.status,
        })
    }

    async fn capture_payment(&self, input: PaymentDataInput) -> ProviderResult<PaymentDataOutput> {
        let data = payment_data(input.data.as_ref(), "capture")?;

        let transaction = self.gateway.get_transaction(&data.tx_id).await?;
        if status::is_paid(&transaction.status) {
            info!("Tpay payment captured: tx_id={}", data.tx_id);
            return Ok(PaymentDataOutput { data: input.data });
        }

        Err(ProviderError::not_allowed(format!(
            "Cannot capture payment for transaction with status {}.",
            transaction.status
        )))
    }

    async fn refund_payment(
        &self,
        input: RefundPaymentInput,
    ) -> ProviderResult<PaymentDataOutput> {
        let data = payment_data(input.data.as_ref(), "refund")?;

        info!("Refunding Tpay payment: tx_id={}, amount={}", data.tx_id, input.amount);

        let request = RefundRequest {
            amount: input.amount,
            description: self.options.refund_description.clone(),
        };
        let refund = self.gateway.create_refund(&data.tx_id, &request).await?;

        if !refund.is_success() {
            warn!("Tpay refund rejected: tx_id={}, result={}", data.tx_id, refund.result);
            return Err(ProviderError::unexpected_state(
                "Refund request was not successful.",
            ));
        }

        Ok(PaymentDataOutput { data: input.data })
    }

    async fn cancel_payment(&self, input: PaymentDataInput) -> ProviderResult<PaymentDataOutput> {
        let data = payment_data(input.data.as_ref(), "cancellation")?;

        let transaction = self.gateway.get_transaction(&data.tx_id).await?;
        if transaction.status == "canceled" {
            debug!("Tpay transaction already canceled: tx_id={}", data.tx_id);
            return Ok(PaymentDataOutput { data: input.data });
        }

        let result = self.gateway.cancel_transaction(&data.tx_id).await?;
        if !result.is_success() {
            warn!("Tpay cancellation rejected: tx_id={}, result={}", data.tx_id, result.result);
            return Err(ProviderError::unexpected_state(
                "Cancellation request was not successful.",
            ));
        }

        info!("Tpay payment canceled: tx_id={}", data.tx_id);
        Ok(PaymentDataOutput { data: input.data })
    }

    async fn get_payment_status(
        &self,
        input: PaymentDataInput,
    ) -> ProviderResult<PaymentStatusOutput> {
        let data = payment_data(input.data.as_ref(), "status check")?;

        let transaction = self.gateway.get_transaction(&data.tx_id).await?;
        debug!(
            "Tpay transaction status: tx_id={}, status={}",
            data.tx_id, transaction.status
        );

        Ok(PaymentStatusOutput {
            status: status::session_status(&transaction.status),
        })
    }

    async fn retrieve_payment(
        &self,
        input: PaymentDataInput,
    ) -> ProviderResult<PaymentDataOutput> {
        Ok(PaymentDataOutput { data: input.data })
    }

    async fn delete_payment(&self, input: PaymentDataInput) -> ProviderResult<PaymentDataOutput> {
        Ok(PaymentDataOutput { data: input.data })
    }

    async fn update_payment(
        &self,
        _input: UpdatePaymentInput,
    ) -> ProviderResult<PaymentDataOutput> {
        Err(ProviderError::invalid_argument(
            "Updating tpay payments is not supported.",
        ))
    }

    async fn get_webhook_action_and_data(
        &self,
        payload: WebhookPayload,
    ) -> ProviderResult<WebhookActionResult> {
        let notification = self.gateway.validate_notification(&payload).map_err(|e| {
            warn!("Rejected Tpay webhook: {}", e);
            ProviderError::invalid_data(format!("Invalid Tpay webhook payload received. {}", e))
        })?;

        let amount = Decimal::from_str(&notification.tr_amount).map_err(|e| {
            ProviderError::invalid_data(format!(
                "Invalid amount '{}' in Tpay webhook: {}",
                notification.tr_amount, e
            ))
        })?;

        let action = status::webhook_action(&notification.tr_status, self.options.paid_action);

        info!(
            "Tpay webhook verified: session={}, tr_status={}, action={:?}",
            notification.tr_crc, notification.tr_status, action
        );

        Ok(WebhookActionResult {
            action,
            data: Some(WebhookActionData {
                session_id: notification.tr_crc,
                amount,
            }),
        })
    }
}
