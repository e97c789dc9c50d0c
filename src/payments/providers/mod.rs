//! Payment provider implementations
//!
//! Concrete implementations of the PaymentProvider trait for different gateways.

pub mod tpay;

pub use tpay::{TpayClient, TpayProvider};
