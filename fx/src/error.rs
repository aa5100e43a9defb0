//! FX engine error types.

use std::sync::Arc;

use salaryfx_common::Currency;
use thiserror::Error;

/// Errors raised while fetching a rate table from an upstream provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("Rate provider returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded.
    #[error("Failed to decode rate response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Upstream returned rates for a different base than requested.
    #[error("Requested rates for {requested}, provider returned {returned}")]
    BaseMismatch { requested: Currency, returned: Currency },

    /// Upstream returned no usable rates.
    #[error("Rate table for {0} contains no usable rates")]
    EmptyTable(Currency),

    /// Provider could not serve the request for another reason.
    #[error("Rate provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// No cached table exists and the upstream fetch failed. The source is
    /// shared by every caller that waited on the same failed refresh.
    #[error("Exchange rates for {base} unavailable: {source}")]
    ProviderUnavailable {
        base: Currency,
        #[source]
        source: Arc<ProviderError>,
    },

    /// Target currency is not present in the rate table.
    #[error("Currency {target} not found in {base} rate table")]
    UnknownCurrency { base: Currency, target: Currency },

    /// Amount is NaN or infinite.
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
}

impl FxError {
    /// Check if a later attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::ProviderUnavailable { .. })
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            FxError::UnknownCurrency { .. } => "UNKNOWN_CURRENCY",
            FxError::InvalidAmount(_) => "INVALID_AMOUNT",
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let unavailable = FxError::ProviderUnavailable {
            base: Currency::usd(),
            source: Arc::new(ProviderError::Unavailable("connection refused".to_string())),
        };
        assert_eq!(unavailable.error_code(), "PROVIDER_UNAVAILABLE");
        assert!(unavailable.is_retryable());
        assert!(unavailable.to_string().contains("connection refused"));

        let unknown = FxError::UnknownCurrency {
            base: Currency::usd(),
            target: Currency::new("XYZ"),
        };
        assert_eq!(unknown.error_code(), "UNKNOWN_CURRENCY");
        assert!(!unknown.is_retryable());
        assert_eq!(unknown.to_string(), "Currency XYZ not found in USD rate table");
    }
}
