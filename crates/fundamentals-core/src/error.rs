use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FundamentalsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse {field}: {message}")]
    Parse { field: &'static str, message: String },

    #[error("Rate limit exhausted, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error: {0}")]
    Api(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl FundamentalsError {
    /// Parse failure for a named input field.
    pub fn parse(field: &'static str, err: impl std::fmt::Display) -> Self {
        FundamentalsError::Parse {
            field,
            message: err.to_string(),
        }
    }

    /// How long the caller should hold off, if this is a rate-limit rejection.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FundamentalsError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FundamentalsError::RateLimited { .. })
    }
}
