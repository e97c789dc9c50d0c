//! Payment provider trait definitions
//!
//! Defines the lifecycle contract every provider exposes to the host framework.

use crate::error::ProviderResult;
use crate::payments::types::{
    AuthorizePaymentOutput, InitiatePaymentInput, InitiatePaymentOutput, PaymentDataInput,
    PaymentDataOutput, PaymentStatusOutput, RefundPaymentInput, UpdatePaymentInput,
    WebhookActionResult, WebhookPayload,
};
use async_trait::async_trait;

/// Trait for payment provider implementations
///
/// Each operation receives the session data previously returned by
/// `initiate_payment` and either succeeds with a typed result or fails with
/// a classified [`ProviderError`](crate::error::ProviderError). Nothing is
/// retried here; retry policy belongs to the host.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Stable identifier the host registers the provider under
    fn identifier(&self) -> &'static str;

    /// Start a payment session with the gateway
    ///
    /// Returns the gateway transaction id, the session data the host must
    /// store, and the initial session status.
    async fn initiate_payment(
        &self,
        input: InitiatePaymentInput,
    ) -> ProviderResult<InitiatePaymentOutput>;

    /// Check whether the session has been authorized by the payer
    async fn authorize_payment(
        &self,
        input: PaymentDataInput,
    ) -> ProviderResult<AuthorizePaymentOutput>;

    /// Capture an authorized payment
    async fn capture_payment(&self, input: PaymentDataInput) -> ProviderResult<PaymentDataOutput>;

    /// Refund part or all of a captured payment
    async fn refund_payment(&self, input: RefundPaymentInput)
        -> ProviderResult<PaymentDataOutput>;

    /// Cancel a payment session
    async fn cancel_payment(&self, input: PaymentDataInput) -> ProviderResult<PaymentDataOutput>;

    /// Fetch the current session status from the gateway
    async fn get_payment_status(
        &self,
        input: PaymentDataInput,
    ) -> ProviderResult<PaymentStatusOutput>;

    async fn retrieve_payment(&self, input: PaymentDataInput)
        -> ProviderResult<PaymentDataOutput>;

    async fn delete_payment(&self, input: PaymentDataInput) -> ProviderResult<PaymentDataOutput>;

    async fn update_payment(&self, input: UpdatePaymentInput)
        -> ProviderResult<PaymentDataOutput>;

    /// Verify an inbound webhook and translate it into a normalized action
    ///
    /// Must reject any payload that fails verification. Never mutates
    /// stored session state.
    async fn get_webhook_action_and_data(
        &self,
        payload: WebhookPayload,
    ) -> ProviderResult<WebhookActionResult>;
}
