//! Application configuration.

use std::time::Duration;

use salaryfx_common::Currency;
use salaryfx_fx::{FxEngineConfig, HttpProviderConfig, RateCacheConfig};
use salaryfx_jobs::AdzunaConfig;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Rate provider endpoint.
    pub rates: HttpProviderConfig,
    /// FX engine configuration.
    pub engine: FxEngineConfig,
    /// Listing source configuration.
    pub adzuna: AdzunaConfig,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON log lines.
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rates: HttpProviderConfig::default(),
            engine: FxEngineConfig::default(),
            adzuna: AdzunaConfig::default(),
            log_level: "warn".to_string(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("SALARYFX_RATES_URL") {
            config.rates.base_url = url;
        }

        if let Some(secs) = lookup("SALARYFX_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.rates.timeout = Duration::from_secs(secs);
                config.adzuna.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = lookup("SALARYFX_RATE_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.engine.cache = RateCacheConfig {
                    ttl: Duration::from_secs(secs),
                };
            }
        }

        if let Some(code) = lookup("SALARYFX_NATIVE_CURRENCY") {
            config.adzuna.native_currency = Currency::new(code);
        }

        if let Some(url) = lookup("ADZUNA_BASE_URL") {
            config.adzuna.base_url = url;
        }

        config.adzuna.app_id = lookup("ADZUNA_APP_ID");
        config.adzuna.app_key = lookup("ADZUNA_APP_KEY");

        if let Some(level) = lookup("SALARYFX_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(json) = lookup("SALARYFX_LOG_JSON") {
            config.log_json = matches!(json.as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.rates.validate()?;
        self.engine.validate()?;
        self.adzuna.validate()?;

        if Currency::parse(self.adzuna.native_currency.code()).is_err() {
            return Err(format!(
                "Invalid native currency: {}",
                self.adzuna.native_currency
            ));
        }

        Ok(())
    }
}
