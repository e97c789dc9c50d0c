//! Tpay OpenAPI client
//!
//! [`TransactionGateway`] is the narrow call surface the provider needs from
//! Tpay. [`TpayClient`] implements it over HTTP with an OAuth client
//! credentials token that is cached until shortly before it expires.

use super::notification::{NotificationError, NotificationVerifier, TpayNotification};
use super::types::{
    AccessToken, ActionResult, CreateTransactionRequest, ErrorBody, RefundRequest, Transaction,
};
use crate::error::ProviderError;
use crate::payments::options::TpayOptions;
use crate::payments::types::WebhookPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Seconds before expiry at which a cached token is refreshed
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Tpay resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Tpay authentication failed: {message}")]
    Authentication { message: String },

    #[error("Tpay API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Tpay request failed: {message}")]
    Transport { message: String },

    #[error("Invalid Tpay response: {message}")]
    Decode { message: String },
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { .. } => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode {
                message: err.to_string(),
            }
        } else {
            GatewayError::Transport {
                message: err.to_string(),
            }
        }
    }
}

impl From<GatewayError> for ProviderError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound { resource } => {
                ProviderError::not_found(format!("Tpay transaction with ID {} not found.", resource))
            }
            other => {
                let is_retryable = other.is_retryable();
                ProviderError::gateway(other.to_string(), is_retryable)
            }
        }
    }
}

/// Calls the provider makes against Tpay
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> GatewayResult<Transaction>;

    /// Fetch a transaction by id or title
    async fn get_transaction(&self, transaction_id: &str) -> GatewayResult<Transaction>;

    async fn create_refund(
        &self,
        transaction_id: &str,
        request: &RefundRequest,
    ) -> GatewayResult<ActionResult>;

    async fn cancel_transaction(&self, transaction_id: &str) -> GatewayResult<ActionResult>;

    /// Verify an inbound notification with the merchant credentials
    fn validate_notification(
        &self,
        payload: &WebhookPayload,
    ) -> Result<TpayNotification, NotificationError>;
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now()
    }
}

/// HTTP implementation of [`TransactionGateway`]
pub struct TpayClient {
    http_client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    verifier: NotificationVerifier,
    token: Mutex<Option<CachedToken>>,
}

impl TpayClient {
    pub fn new(options: &TpayOptions, request_timeout: Duration) -> GatewayResult<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("tpay-payment-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let base_url = options.api_base_url().to_string();

        info!(
            "Tpay client initialized with URL: {} (sandbox={})",
            base_url, options.sandbox
        );

        if options.uses_client_secret_for_notifications() {
            warn!("No Tpay security_code configured, verifying notifications with client_secret");
        }

        Ok(Self {
            http_client,
            base_url,
            client_id: options.client_id.clone(),
            client_secret: options.client_secret.clone(),
            verifier: NotificationVerifier::new(
                options.security_code(),
                options.merchant_id.clone(),
            ),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> GatewayResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        debug!("Requesting Tpay access token");

        let response = self
            .http_client
            .post(format!("{}/oauth/auth", self.base_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Tpay authentication failed: HTTP {}: {}", status, body);
            return Err(GatewayError::Authentication {
                message: format!("HTTP {}", status),
            });
        }

        let token: AccessToken = response.json().await?;
        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        });

        Ok(value)
    }

    async fn authorized(&self, method: Method, path: &str) -> GatewayResult<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(self
            .http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token))
    }

    /// Send a request and decode the JSON body
    ///
    /// A 404 becomes `NotFound` only when `resource` names the transaction
    /// being looked up; otherwise it is reported as an API error.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: Option<&str>,
    ) -> GatewayResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                error!("Failed to parse Tpay response: {}", e);
                GatewayError::Decode {
                    message: e.to_string(),
                }
            });
        }

        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.summary())
            .unwrap_or(text);

        match (status, resource) {
            (StatusCode::NOT_FOUND, Some(resource)) => Err(GatewayError::NotFound {
                resource: resource.to_string(),
            }),
            (StatusCode::UNAUTHORIZED, _) => {
                warn!("Tpay rejected access token, dropping cached token");
                self.token.lock().await.take();
                Err(GatewayError::Authentication { message: detail })
            }
            _ => {
                error!("Tpay API error: HTTP {}: {}", status, detail);
                Err(GatewayError::Api {
                    status: status.as_u16(),
                    message: detail,
                })
            }
        }
    }
}

fn path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

#[async_trait]
impl TransactionGateway for TpayClient {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> GatewayResult<Transaction> {
        let builder = self
            .authorized(Method::POST, "/transactions")
            .await?
            .json(request);
        self.execute(builder, None).await
    }

    async fn get_transaction(&self, transaction_id: &str) -> GatewayResult<Transaction> {
        let path = format!("/transactions/{}", path_segment(transaction_id));
        let builder = self.authorized(Method::GET, &path).await?;
        self.execute(builder, Some(transaction_id)).await
    }

    async fn create_refund(
        &self,
        transaction_id: &str,
        request: &RefundRequest,
    ) -> GatewayResult<ActionResult> {
        let path = format!("/transactions/{}/refunds", path_segment(transaction_id));
        let builder = self.authorized(Method::POST, &path).await?.json(request);
        self.execute(builder, Some(transaction_id)).await
    }

    async fn cancel_transaction(&self, transaction_id: &str) -> GatewayResult<ActionResult> {
        let path = format!("/transactions/{}/cancel", path_segment(transaction_id));
        let builder = self.authorized(Method::POST, &path).await?;
        self.execute(builder, Some(transaction_id)).await
    }

    fn validate_notification(
        &self,
        payload: &WebhookPayload,
    ) -> Result<TpayNotification, NotificationError> {
        self.verifier.verify(payload)
    }
}
