//! Error types shared across SalaryFX crates.

use thiserror::Error;

/// A currency code that is not three ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: '{0}'")]
pub struct CurrencyCodeError(pub String);
