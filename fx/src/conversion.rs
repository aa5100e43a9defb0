//! Currency conversion arithmetic.

use salaryfx_common::{format_amount, Currency};
use serde::Serialize;

use crate::error::{FxError, FxResult};
use crate::table::RateTable;

/// Outcome of converting a single amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub original_amount: f64,
    pub original_currency: Currency,
    /// Unrounded; round only for display.
    pub converted_amount: f64,
    pub converted_currency: Currency,
    /// Rate applied, units of target per unit of original.
    pub rate: f64,
    /// Publication date of the rate table used.
    pub source_date: String,
}

impl ConversionResult {
    /// Original amount rendered with its currency symbol.
    pub fn formatted_original(&self) -> String {
        format_amount(self.original_amount, &self.original_currency)
    }

    /// Converted amount rendered with its currency symbol.
    pub fn formatted_converted(&self) -> String {
        format_amount(self.converted_amount, &self.converted_currency)
    }
}

/// Convert `amount` of `table.base` into `target`.
pub fn convert(amount: f64, table: &RateTable, target: &Currency) -> FxResult<ConversionResult> {
    if !amount.is_finite() {
        return Err(FxError::InvalidAmount(amount));
    }

    let rate = table.rate(target).ok_or_else(|| FxError::UnknownCurrency {
        base: table.base.clone(),
        target: target.clone(),
    })?;

    Ok(ConversionResult {
        original_amount: amount,
        original_currency: table.base.clone(),
        converted_amount: amount * rate,
        converted_currency: target.clone(),
        rate,
        source_date: table.source_date.clone(),
    })
}
