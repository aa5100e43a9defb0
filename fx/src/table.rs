//! Exchange-rate tables.

use std::collections::HashMap;

use salaryfx_common::{Currency, Timestamp};
use serde::Serialize;
use tracing::warn;

use crate::error::ProviderError;

/// Full set of rates for one base currency.
///
/// One unit of `base` buys `rates[X]` units of `X`. The identity rate for
/// `base` is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    /// Currency the rates are quoted against.
    pub base: Currency,
    /// When this table was retrieved from the provider.
    pub retrieved_at: Timestamp,
    /// Publication date reported by the provider.
    pub source_date: String,
    rates: HashMap<Currency, f64>,
}

impl RateTable {
    /// Build a table from raw provider rates.
    ///
    /// Entries that are not finite and strictly positive are dropped. Fails
    /// with [`ProviderError::EmptyTable`] when nothing usable remains.
    pub fn new(
        base: Currency,
        rates: impl IntoIterator<Item = (Currency, f64)>,
        source_date: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let mut table = HashMap::new();
        for (currency, rate) in rates {
            if rate.is_finite() && rate > 0.0 {
                table.insert(currency, rate);
            } else {
                warn!(base = %base, currency = %currency, rate, "Dropping invalid rate");
            }
        }

        if table.is_empty() {
            return Err(ProviderError::EmptyTable(base));
        }

        table.insert(base.clone(), 1.0);

        Ok(Self {
            base,
            retrieved_at: salaryfx_common::now(),
            source_date: source_date.into(),
            rates: table,
        })
    }

    /// Rate from the base currency to `target`.
    pub fn rate(&self, target: &Currency) -> Option<f64> {
        self.rates.get(target).copied()
    }

    /// Check if the table quotes `target`.
    pub fn contains(&self, target: &Currency) -> bool {
        self.rates.contains_key(target)
    }

    /// All quoted rates.
    pub fn rates(&self) -> &HashMap<Currency, f64> {
        &self.rates
    }

    /// Number of quoted currencies, including the base.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
