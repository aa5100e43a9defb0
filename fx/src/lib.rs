//! SalaryFX FX Engine
//!
//! Exchange-rate caching and currency conversion.
//!
//! # Features
//!
//! - Pluggable rate providers, with an HTTP implementation
//! - One cached rate table per base currency with a configurable TTL
//! - Stale fallback when the provider is down
//! - Coalescing of concurrent misses for the same base currency
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use salaryfx_fx::{FxEngine, FxEngineConfig, HttpProviderConfig, HttpRateProvider};
//! use salaryfx_common::Currency;
//!
//! let provider = Arc::new(HttpRateProvider::new(HttpProviderConfig::default())?);
//! let engine = FxEngine::new(provider, FxEngineConfig::default());
//!
//! let result = engine.convert(1000.0, &Currency::usd(), &Currency::eur()).await?;
//! println!("{}", result.formatted_converted());
//! ```

pub mod cache;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod provider;
pub mod table;

pub use cache::{CacheStats, Freshness, RateCache, RateCacheConfig, RateLookup};
pub use conversion::{convert, ConversionResult};
pub use engine::{ConversionOutcome, FxEngine, FxEngineConfig};
pub use error::{FxError, FxResult, ProviderError};
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
pub use provider::{HttpProviderConfig, HttpRateProvider, RateProvider, DEFAULT_RATES_URL};
pub use table::RateTable;
