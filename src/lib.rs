//! Tpay payment provider
//!
//! Adapts the Tpay transaction API to a host e-commerce payment-provider
//! contract: lifecycle operations, webhook verification and status mapping,
//! plus an axum endpoint that feeds verified webhooks into the host workflow.

#[cfg(feature = "server")]
pub mod api;
pub mod config;
pub mod error;
pub mod payments;
pub mod workflow;

pub use error::{ProviderError, ProviderResult};
pub use payments::options::{PaidAction, TpayOptions};
pub use payments::providers::TpayProvider;
pub use payments::traits::PaymentProvider;
