//! Command-line interface parsing.

use clap::{Parser, Subcommand};
use salaryfx_common::Currency;

/// SalaryFX: currency conversion and salary-normalized job search
#[derive(Parser, Debug)]
#[command(name = "salaryfx")]
#[command(about = "Currency conversion and salary-normalized job search")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an amount between two currencies
    #[command(allow_negative_numbers = true)]
    Convert {
        /// Amount to convert
        amount: f64,
        /// Currency the amount is in
        #[arg(value_parser = Currency::parse)]
        from: Currency,
        /// Currency to convert into
        #[arg(value_parser = Currency::parse)]
        to: Currency,
    },

    /// List the popular currencies with their symbols
    Currencies,

    /// Show the exchange-rate table for a base currency
    Rates {
        /// Base currency
        #[arg(default_value = "USD", value_parser = Currency::parse)]
        base: Currency,
    },

    /// Search job listings and show salaries in a display currency
    Search {
        /// Keywords
        #[arg(short, long, default_value = "")]
        query: String,

        /// Location
        #[arg(short, long, default_value = "")]
        location: String,

        /// Job board country code
        #[arg(long, default_value = "us")]
        country: String,

        /// Result page
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Display currency for salaries
        #[arg(short, long, default_value = "USD", value_parser = Currency::parse)]
        currency: Currency,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from(["salaryfx", "convert", "100", "usd", "EUR"]);
        match cli.command {
            Command::Convert { amount, from, to } => {
                assert_eq!(amount, 100.0);
                assert_eq!(from, Currency::usd());
                assert_eq!(to, Currency::eur());
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_negative_amount() {
        let cli = Cli::parse_from(["salaryfx", "convert", "-12.5", "USD", "EUR"]);
        assert!(matches!(cli.command, Command::Convert { amount, .. } if amount == -12.5));
    }

    #[test]
    fn test_parse_search_defaults() {
        let cli = Cli::parse_from(["salaryfx", "search", "--json"]);
        match cli.command {
            Command::Search {
                query,
                country,
                page,
                currency,
                ..
            } => {
                assert!(query.is_empty());
                assert_eq!(country, "us");
                assert_eq!(page, 1);
                assert_eq!(currency, Currency::usd());
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(cli.json);
    }

    #[test]
    fn test_rejects_malformed_currency() {
        assert!(Cli::try_parse_from(["salaryfx", "convert", "1", "USD", "EURO"]).is_err());
        assert!(Cli::try_parse_from(["salaryfx", "search", "--currency", "€"]).is_err());
        assert!(Cli::try_parse_from(["salaryfx", "rates", "US"]).is_err());
    }

    #[test]
    fn test_parse_rates_normalizes_base() {
        let cli = Cli::parse_from(["salaryfx", "rates", " gbp "]);
        assert!(matches!(cli.command, Command::Rates { base } if base == Currency::gbp()));

        let cli = Cli::parse_from(["salaryfx", "rates"]);
        assert!(matches!(cli.command, Command::Rates { base } if base == Currency::usd()));
    }
}
