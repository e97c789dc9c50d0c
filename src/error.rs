use thiserror::Error;

use crate::payments::options::OptionsError;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Classified failures surfaced to the host by every provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid provider options: {0}")]
    InvalidOptions(#[from] OptionsError),

    #[error("Not allowed: {message}")]
    NotAllowed { message: String },

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Unexpected state: {message}")]
    UnexpectedState { message: String },

    #[error("Gateway error: {message}")]
    Gateway { message: String, is_retryable: bool },
}

impl ProviderError {
    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::NotAllowed {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unexpected_state(message: impl Into<String>) -> Self {
        Self::UnexpectedState {
            message: message.into(),
        }
    }

    pub fn gateway(message: impl Into<String>, is_retryable: bool) -> Self {
        Self::Gateway {
            message: message.into(),
            is_retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Gateway {
                is_retryable: true,
                ..
            }
        )
    }
}
