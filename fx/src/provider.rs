//! Rate provider trait and implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use salaryfx_common::{constants, Currency};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::table::RateTable;

/// Source of exchange-rate tables.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the full rate table for `base`. Called once per cache miss;
    /// implementations do not retry.
    async fn fetch(&self, base: &Currency) -> Result<RateTable, ProviderError>;
}

/// Default rate endpoint, keyed by base currency.
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest";

/// Configuration for [`HttpRateProvider`].
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Endpoint prefix; the base currency code is appended as a path segment.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RATES_URL.to_string(),
            timeout: constants::DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl HttpProviderConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("Rates URL must be http(s): {}", self.base_url));
        }

        if self.timeout.is_zero() {
            return Err("HTTP timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

/// Wire shape of the `{ base, date, rates }` response.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: String,
    #[serde(default)]
    date: String,
    rates: HashMap<String, f64>,
}

/// Fetches rate tables over HTTP from an exchangerate-api style endpoint.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: Client,
    config: HttpProviderConfig,
}

impl HttpRateProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create a provider around an existing HTTP client.
    pub fn with_client(client: Client, config: HttpProviderConfig) -> Self {
        Self { client, config }
    }

    fn url_for(&self, base: &Currency) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), base.code())
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    #[instrument(skip(self), fields(base = %base))]
    async fn fetch(&self, base: &Currency) -> Result<RateTable, ProviderError> {
        let url = self.url_for(base);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let table = parse_rates_response(base, &body)?;

        debug!(currencies = table.len(), date = %table.source_date, "Fetched rate table");
        Ok(table)
    }
}

/// Decode a `{ base, date, rates }` body into a table for `requested`.
pub fn parse_rates_response(requested: &Currency, body: &str) -> Result<RateTable, ProviderError> {
    let response: RatesResponse = serde_json::from_str(body)?;

    let returned = Currency::new(response.base);
    if &returned != requested {
        return Err(ProviderError::BaseMismatch {
            requested: requested.clone(),
            returned,
        });
    }

    RateTable::new(
        returned,
        response
            .rates
            .into_iter()
            .map(|(code, rate)| (Currency::new(code), rate)),
        response.date,
    )
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    tables: dashmap::DashMap<Currency, (Vec<(Currency, f64)>, String)>,
    fetches: dashmap::DashMap<Currency, usize>,
    failing: std::sync::atomic::AtomicBool,
    delay: parking_lot::Mutex<Option<Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            fetches: dashmap::DashMap::new(),
            failing: std::sync::atomic::AtomicBool::new(false),
            delay: parking_lot::Mutex::new(None),
        }
    }

    /// Set the rates served for a base currency.
    pub fn set_rates(&self, base: &str, rates: &[(&str, f64)], date: &str) {
        let rates = rates
            .iter()
            .map(|(code, rate)| (Currency::new(*code), *rate))
            .collect();
        self.tables
            .insert(Currency::new(base), (rates, date.to_string()));
    }

    /// Make every subsequent fetch fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Delay every fetch, to widen race windows in concurrency tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Total fetches issued for a base currency.
    pub fn fetch_count(&self, base: &str) -> usize {
        self.fetches
            .get(&Currency::new(base))
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Total fetches issued across all base currencies.
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, base: &Currency) -> Result<RateTable, ProviderError> {
        *self.fetches.entry(base.clone()).or_insert(0) += 1;

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ProviderError::Unavailable(format!(
                "{} is offline",
                self.name
            )));
        }

        let (rates, date) = self
            .tables
            .get(base)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ProviderError::Unavailable(format!("no rates for {}", base)))?;

        RateTable::new(base.clone(), rates, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rates_response() {
        let body = r#"{
            "provider": "https://www.exchangerate-api.com",
            "base": "USD",
            "date": "2024-01-15",
            "time_last_updated": 1705276801,
            "rates": { "USD": 1, "EUR": 0.913, "GBP": 0.786, "JPY": 146.2 }
        }"#;

        let table = parse_rates_response(&Currency::usd(), body).unwrap();

        assert_eq!(table.base, Currency::usd());
        assert_eq!(table.source_date, "2024-01-15");
        assert_eq!(table.rate(&Currency::eur()), Some(0.913));
        assert_eq!(table.rate(&Currency::jpy()), Some(146.2));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_parse_rejects_base_mismatch() {
        let body = r#"{ "base": "EUR", "date": "2024-01-15", "rates": { "USD": 1.09 } }"#;

        let result = parse_rates_response(&Currency::usd(), body);

        assert!(matches!(result, Err(ProviderError::BaseMismatch { .. })));
    }

    #[test]
    fn test_parse_rejects_malformed_body() {
        let result = parse_rates_response(&Currency::usd(), "<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(ProviderError::Decode(_))));

        let result = parse_rates_response(&Currency::usd(), r#"{ "base": "USD", "rates": {} }"#);
        assert!(matches!(result, Err(ProviderError::EmptyTable(_))));
    }

    #[test]
    fn test_http_config_validation() {
        assert!(HttpProviderConfig::default().validate().is_ok());

        let config = HttpProviderConfig {
            base_url: "ftp://rates.example".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = HttpProviderConfig {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_for_base() {
        let provider = HttpRateProvider::with_client(
            Client::new(),
            HttpProviderConfig {
                base_url: "https://rates.example/v4/latest/".to_string(),
                ..Default::default()
            },
        );

        assert_eq!(
            provider.url_for(&Currency::eur()),
            "https://rates.example/v4/latest/EUR"
        );
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockRateProvider::new("test");
        provider.set_rates("USD", &[("EUR", 0.9)], "2024-01-15");

        let table = provider.fetch(&Currency::usd()).await.unwrap();
        assert_eq!(table.rate(&Currency::eur()), Some(0.9));
        assert_eq!(provider.fetch_count("USD"), 1);

        provider.set_failing(true);
        assert!(provider.fetch(&Currency::usd()).await.is_err());
        assert!(provider.fetch(&Currency::gbp()).await.is_err());
        assert_eq!(provider.total_fetches(), 3);
    }
}
