//! Main FX engine implementation.

use std::sync::Arc;

use salaryfx_common::Currency;
use tracing::{info, instrument, warn};

use crate::cache::{CacheStats, Freshness, RateCache, RateCacheConfig, RateLookup};
use crate::conversion::{self, ConversionResult};
use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;

/// Configuration for the FX engine.
#[derive(Debug, Clone, Default)]
pub struct FxEngineConfig {
    /// Cache configuration.
    pub cache: RateCacheConfig,
}

impl FxEngineConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()
    }
}

/// A conversion together with how its rate table was obtained.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub result: ConversionResult,
    pub freshness: Freshness,
    /// Set when stale rates were used.
    pub warning: Option<String>,
}

/// The main FX engine.
pub struct FxEngine {
    cache: RateCache,
}

impl FxEngine {
    /// Create a new FX engine with the given provider.
    pub fn new(provider: Arc<dyn RateProvider>, config: FxEngineConfig) -> Self {
        Self {
            cache: RateCache::with_config(provider, config.cache),
        }
    }

    /// Get the rate table for a base currency.
    pub async fn rates(&self, base: &Currency) -> FxResult<RateLookup> {
        self.cache.get_rates(base).await
    }

    /// Convert an amount between two currencies.
    pub async fn convert(
        &self,
        amount: f64,
        from: &Currency,
        to: &Currency,
    ) -> FxResult<ConversionResult> {
        self.convert_detailed(amount, from, to)
            .await
            .map(|outcome| outcome.result)
    }

    /// Convert an amount, also reporting rate freshness.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn convert_detailed(
        &self,
        amount: f64,
        from: &Currency,
        to: &Currency,
    ) -> FxResult<ConversionOutcome> {
        if !amount.is_finite() {
            return Err(FxError::InvalidAmount(amount));
        }

        let lookup = self.cache.get_rates(from).await?;
        let result = conversion::convert(amount, &lookup.table, to)?;

        if let Some(warning) = &lookup.warning {
            warn!(warning = %warning, "Conversion used stale rates");
        }

        info!(
            rate = result.rate,
            converted = result.converted_amount,
            freshness = ?lookup.freshness,
            "Conversion completed"
        );

        Ok(ConversionOutcome {
            result,
            freshness: lookup.freshness,
            warning: lookup.warning,
        })
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Get engine statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
