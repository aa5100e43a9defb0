//! Listing source errors and per-listing normalization warnings.

use salaryfx_common::Currency;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by a listing source.
#[derive(Debug, Error)]
pub enum ListingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("Listing source returned HTTP {status}")]
    Status { status: u16 },

    /// Failed to parse JSON response.
    #[error("Failed to decode listing response: {0}")]
    Decode(#[from] serde_json::Error),

    /// API credentials are not configured.
    #[error("Missing listing source credentials: {0}")]
    MissingCredentials(&'static str),
}

/// Why a listing came back without (or with caveated) converted salary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingWarning {
    /// No rate table could be obtained for the listing's currency.
    #[error("Exchange rates for {base} unavailable: {reason}")]
    RateLookupFailed { base: Currency, reason: String },

    /// A rate table was available but the conversion failed.
    #[error("Salary conversion failed: {reason}")]
    ConversionFailed { reason: String },

    /// Converted with rates past their TTL.
    #[error("Converted with stale {base} rates: {reason}")]
    StaleRates { base: Currency, reason: String },
}

impl ListingWarning {
    /// Check if the warning means the listing was left unconverted.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ListingWarning::StaleRates { .. })
    }
}

/// Summary of the listings in a batch that could not be converted.
///
/// Reported alongside a batch, never as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} of {total} listings could not be converted", .failed.len())]
pub struct PartialBatchFailure {
    /// Positions of the failed listings in the input.
    pub failed: Vec<usize>,
    /// Batch size.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_classification() {
        let stale = ListingWarning::StaleRates {
            base: Currency::usd(),
            reason: "provider down".to_string(),
        };
        let failed = ListingWarning::ConversionFailed {
            reason: "Currency XYZ not found in USD rate table".to_string(),
        };

        assert!(!stale.is_failure());
        assert!(failed.is_failure());
        assert_eq!(
            failed.to_string(),
            "Salary conversion failed: Currency XYZ not found in USD rate table"
        );
    }

    #[test]
    fn test_partial_failure_message() {
        let failure = PartialBatchFailure {
            failed: vec![6],
            total: 20,
        };
        assert_eq!(failure.to_string(), "1 of 20 listings could not be converted");
    }
}
