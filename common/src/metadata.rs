//! Static currency metadata: display symbols, the popular-currency list and
//! amount formatting.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::currency::Currency;

/// Display metadata for a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    /// ISO 4217 code.
    pub code: &'static str,
    /// English display name.
    pub name: &'static str,
    /// Display symbol.
    pub symbol: &'static str,
}

/// Currencies offered in currency pickers, in display order.
pub static POPULAR_CURRENCIES: [CurrencyInfo; 10] = [
    CurrencyInfo {
        code: "USD",
        name: "US Dollar",
        symbol: "$",
    },
    CurrencyInfo {
        code: "EUR",
        name: "Euro",
        symbol: "€",
    },
    CurrencyInfo {
        code: "GBP",
        name: "British Pound",
        symbol: "£",
    },
    CurrencyInfo {
        code: "CAD",
        name: "Canadian Dollar",
        symbol: "CA$",
    },
    CurrencyInfo {
        code: "AUD",
        name: "Australian Dollar",
        symbol: "A$",
    },
    CurrencyInfo {
        code: "JPY",
        name: "Japanese Yen",
        symbol: "¥",
    },
    CurrencyInfo {
        code: "CHF",
        name: "Swiss Franc",
        symbol: "CHF",
    },
    CurrencyInfo {
        code: "INR",
        name: "Indian Rupee",
        symbol: "₹",
    },
    CurrencyInfo {
        code: "CNY",
        name: "Chinese Yuan",
        symbol: "¥",
    },
    CurrencyInfo {
        code: "BRL",
        name: "Brazilian Real",
        symbol: "R$",
    },
];

/// Decimal places used when rendering amounts for display.
pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

/// Get the popular-currency list.
pub fn popular_currencies() -> &'static [CurrencyInfo] {
    &POPULAR_CURRENCIES
}

/// Look up metadata for a currency, if it is one of the popular ones.
pub fn currency_info(currency: &Currency) -> Option<&'static CurrencyInfo> {
    POPULAR_CURRENCIES.iter().find(|info| info.code == currency.code())
}

/// Display symbol for a currency. Unknown currencies use their code.
pub fn symbol_for(currency: &Currency) -> &str {
    match currency_info(currency) {
        Some(info) => info.symbol,
        None => currency.code(),
    }
}

/// Format an amount with its currency symbol, en-US digit grouping and
/// exactly two decimal places, e.g. `€1,234.50`.
pub fn format_amount(amount: f64, currency: &Currency) -> String {
    let symbol = symbol_for(currency);

    let Some(value) = Decimal::from_f64(amount) else {
        // NaN, infinities and values outside Decimal's range
        return format!("{}{}", symbol, amount);
    };

    let mut rounded = value
        .round_dp_with_strategy(DISPLAY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DISPLAY_DECIMAL_PLACES);

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = rounded.abs().to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popular_currencies() {
        let codes: Vec<&str> = popular_currencies().iter().map(|c| c.code).collect();
        assert_eq!(codes.len(), 10);
        assert_eq!(codes[0], "USD");
        assert!(codes.contains(&"BRL"));
    }

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(symbol_for(&Currency::usd()), "$");
        assert_eq!(symbol_for(&Currency::new("cad")), "CA$");
        assert_eq!(symbol_for(&Currency::new("SEK")), "SEK");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.5, &Currency::eur()), "€1,234.50");
        assert_eq!(format_amount(1_000_000.0, &Currency::usd()), "$1,000,000.00");
        assert_eq!(format_amount(999.0, &Currency::gbp()), "£999.00");
        assert_eq!(format_amount(0.0, &Currency::jpy()), "¥0.00");
        assert_eq!(format_amount(42.0, &Currency::new("SEK")), "SEK42.00");
    }

    #[test]
    fn test_format_amount_rounds_half_away_from_zero() {
        assert_eq!(format_amount(0.125, &Currency::usd()), "$0.13");
        assert_eq!(format_amount(-0.125, &Currency::usd()), "-$0.13");
        assert_eq!(format_amount(-0.001, &Currency::usd()), "$0.00");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_amount(f64::NAN, &Currency::usd()), "$NaN");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
