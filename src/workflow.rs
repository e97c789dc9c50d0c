//! Host payment-processing workflow
//!
//! The webhook endpoint hands every verified result to a [`PaymentWorkflow`].
//! Updating session state is the workflow's job, never the provider's.

use crate::payments::types::WebhookActionResult;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow request failed: {message}")]
    Request { message: String },

    #[error("Workflow rejected result (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait PaymentWorkflow: Send + Sync {
    async fn process_payment(&self, result: &WebhookActionResult) -> Result<(), WorkflowError>;
}

/// Logs results; used in development when no host workflow URL is configured
#[derive(Debug, Default, Clone)]
pub struct LoggingWorkflow;

#[async_trait]
impl PaymentWorkflow for LoggingWorkflow {
    async fn process_payment(&self, result: &WebhookActionResult) -> Result<(), WorkflowError> {
        match &result.data {
            Some(data) => info!(
                "Payment webhook processed: action={:?}, session={}, amount={}",
                result.action, data.session_id, data.amount
            ),
            None => info!("Payment webhook processed: action={:?}", result.action),
        }
        Ok(())
    }
}

/// Forwards results as JSON to the host's payment-processing endpoint
pub struct HttpWorkflow {
    http_client: Client,
    url: String,
}

impl HttpWorkflow {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WorkflowError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkflowError::Request {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PaymentWorkflow for HttpWorkflow {
    async fn process_payment(&self, result: &WebhookActionResult) -> Result<(), WorkflowError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(result)
            .send()
            .await
            .map_err(|e| {
                error!("Host workflow request failed: {}", e);
                WorkflowError::Request {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Host workflow rejected webhook result: HTTP {}: {}", status, message);
            return Err(WorkflowError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::types::{WebhookAction, WebhookActionData};
    use rust_decimal::Decimal;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authorized_result() -> WebhookActionResult {
        WebhookActionResult {
            action: WebhookAction::Authorized,
            data: Some(WebhookActionData {
                session_id: "s1".to_string(),
                amount: Decimal::new(4999, 2),
            }),
        }
    }

    #[tokio::test]
    async fn test_http_workflow_posts_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments/process"))
            .and(body_json(serde_json::json!({
                "action": "authorized",
                "data": { "session_id": "s1", "amount": "49.99" }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let workflow = HttpWorkflow::new(
            format!("{}/payments/process", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();

        workflow.process_payment(&authorized_result()).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_workflow_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_string("session locked"))
            .mount(&server)
            .await;

        let workflow = HttpWorkflow::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = workflow
            .process_payment(&authorized_result())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Rejected { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_logging_workflow_accepts_everything() {
        let result = WebhookActionResult {
            action: WebhookAction::Pending,
            data: None,
        };
        assert!(LoggingWorkflow.process_payment(&result).await.is_ok());
    }
}
