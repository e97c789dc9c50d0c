//! Payment provider integration module
//!
//! This module provides the host-facing payment provider contract, provider
//! options validation and the Tpay gateway adapter.

pub mod options;
pub mod providers;
pub mod traits;
pub mod types;
