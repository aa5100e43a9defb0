//! Salary normalization into a display currency.
//!
//! A batch is converted in two phases. Distinct native currencies are
//! resolved first, each through the rate cache exactly once per call and all
//! concurrently. Every listing then converts its bounds as soon as its own
//! currency's table is available. A failure in either phase stays with the
//! listings it affects.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use salaryfx_common::{format_amount, Currency};
use salaryfx_fx::{convert, Freshness, FxEngine, FxError, RateLookup};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ListingWarning, PartialBatchFailure};
use crate::listing::Listing;

type SharedLookup<'a> = Shared<BoxFuture<'a, Result<RateLookup, Arc<FxError>>>>;

/// Salary bounds converted into the display currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedSalary {
    pub min: f64,
    pub max: f64,
    pub currency: Currency,
    /// Rate applied to both bounds.
    pub rate: f64,
    pub source_date: String,
    pub freshness: Freshness,
}

impl ConvertedSalary {
    /// Render as `min – max` with currency symbols.
    pub fn formatted(&self) -> String {
        format!(
            "{} – {}",
            format_amount(self.min, &self.currency),
            format_amount(self.max, &self.currency)
        )
    }
}

/// A listing annotated with its converted salary.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedListing {
    pub listing: Listing,
    /// Absent when the listing passed through or failed to convert.
    pub converted: Option<ConvertedSalary>,
    pub warning: Option<ListingWarning>,
}

impl NormalizedListing {
    fn passthrough(listing: Listing) -> Self {
        Self {
            listing,
            converted: None,
            warning: None,
        }
    }

    fn failed(listing: Listing, warning: ListingWarning) -> Self {
        Self {
            listing,
            converted: None,
            warning: Some(warning),
        }
    }

    /// Check if conversion was attempted and failed.
    pub fn is_failed(&self) -> bool {
        self.warning.as_ref().is_some_and(ListingWarning::is_failure)
    }
}

/// Result of normalizing one batch of listings.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedBatch {
    /// Correlates log lines for this call.
    pub batch_id: Uuid,
    /// Display currency.
    pub target: Currency,
    /// One entry per input listing, in input order.
    pub listings: Vec<NormalizedListing>,
}

impl NormalizedBatch {
    /// Summary of failed listings, if any failed.
    pub fn partial_failure(&self) -> Option<PartialBatchFailure> {
        let failed: Vec<usize> = self
            .listings
            .iter()
            .enumerate()
            .filter(|(_, listing)| listing.is_failed())
            .map(|(index, _)| index)
            .collect();

        if failed.is_empty() {
            return None;
        }

        Some(PartialBatchFailure {
            failed,
            total: self.listings.len(),
        })
    }

    /// Number of listings that carry a converted salary.
    pub fn converted_count(&self) -> usize {
        self.listings
            .iter()
            .filter(|listing| listing.converted.is_some())
            .count()
    }
}

/// Converts listing salaries into a display currency.
pub struct SalaryNormalizer {
    engine: Arc<FxEngine>,
}

impl SalaryNormalizer {
    /// Create a normalizer backed by an FX engine.
    pub fn new(engine: Arc<FxEngine>) -> Self {
        Self { engine }
    }

    /// Annotate `listings` with salaries converted into `target`.
    ///
    /// Never fails: listings that cannot be converted come back unconverted
    /// with a warning.
    #[instrument(skip(self, listings), fields(target = %target, listings = listings.len()))]
    pub async fn normalize(&self, listings: Vec<Listing>, target: &Currency) -> NormalizedBatch {
        let batch_id = Uuid::now_v7();

        let mut lookups: HashMap<Currency, SharedLookup<'_>> = HashMap::new();
        for listing in listings.iter().filter(|l| needs_conversion(l, target)) {
            lookups.entry(listing.currency.clone()).or_insert_with(|| {
                let engine = &self.engine;
                let base = listing.currency.clone();
                async move { engine.rates(&base).await.map_err(Arc::new) }
                    .boxed()
                    .shared()
            });
        }

        let tasks = listings.into_iter().enumerate().map(|(index, listing)| {
            let lookup = if needs_conversion(&listing, target) {
                lookups.get(&listing.currency).cloned()
            } else {
                None
            };
            async move {
                match lookup {
                    Some(lookup) => convert_listing(batch_id, index, listing, lookup, target).await,
                    None => NormalizedListing::passthrough(listing),
                }
            }
        });

        let listings = join_all(tasks).await;

        let batch = NormalizedBatch {
            batch_id,
            target: target.clone(),
            listings,
        };

        let failed = batch.partial_failure().map_or(0, |f| f.failed.len());
        info!(
            batch_id = %batch_id,
            base_currencies = lookups.len(),
            converted = batch.converted_count(),
            failed,
            "Normalized listing batch"
        );

        batch
    }
}

fn needs_conversion(listing: &Listing, target: &Currency) -> bool {
    listing.currency != *target && listing.salary_range().is_some()
}

async fn convert_listing(
    batch_id: Uuid,
    index: usize,
    listing: Listing,
    lookup: SharedLookup<'_>,
    target: &Currency,
) -> NormalizedListing {
    let Some((min, max)) = listing.salary_range() else {
        return NormalizedListing::passthrough(listing);
    };

    let lookup = match lookup.await {
        Ok(lookup) => lookup,
        Err(error) => {
            warn!(
                batch_id = %batch_id,
                index,
                listing_id = %listing.id,
                error = %error,
                "Rate lookup failed for listing"
            );
            let warning = ListingWarning::RateLookupFailed {
                base: listing.currency.clone(),
                reason: error.to_string(),
            };
            return NormalizedListing::failed(listing, warning);
        }
    };

    let converted = convert(min, &lookup.table, target)
        .and_then(|min| Ok((min, convert(max, &lookup.table, target)?)));

    match converted {
        Ok((min, max)) => {
            let warning = lookup.warning.map(|reason| ListingWarning::StaleRates {
                base: listing.currency.clone(),
                reason,
            });
            NormalizedListing {
                converted: Some(ConvertedSalary {
                    min: min.converted_amount,
                    max: max.converted_amount,
                    currency: target.clone(),
                    rate: min.rate,
                    source_date: min.source_date,
                    freshness: lookup.freshness,
                }),
                listing,
                warning,
            }
        }
        Err(error) => {
            warn!(
                batch_id = %batch_id,
                index,
                listing_id = %listing.id,
                error = %error,
                "Salary conversion failed for listing"
            );
            let warning = ListingWarning::ConversionFailed {
                reason: error.to_string(),
            };
            NormalizedListing::failed(listing, warning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use salaryfx_fx::{FxEngineConfig, MockRateProvider, RateCacheConfig};
    use std::time::Duration;

    fn setup() -> (Arc<MockRateProvider>, SalaryNormalizer) {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_rates("USD", &[("EUR", 0.9), ("GBP", 0.8)], "2024-01-15");
        provider.set_rates("GBP", &[("USD", 1.25)], "2024-01-15");

        let engine = FxEngine::new(provider.clone(), FxEngineConfig::default());
        (provider, SalaryNormalizer::new(Arc::new(engine)))
    }

    fn usd_listings(n: usize) -> Vec<Listing> {
        (0..n)
            .map(|i| {
                let base = 50_000.0 + 1_000.0 * i as f64;
                Listing::new(format!("job-{}", i), format!("Job {}", i), Currency::usd())
                    .with_salary(base, base + 20_000.0)
            })
            .collect()
    }

    fn ids(batch: &NormalizedBatch) -> Vec<String> {
        batch.listings.iter().map(|l| l.listing.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_batch_uses_one_fetch_per_base() {
        let (provider, normalizer) = setup();

        let batch = normalizer.normalize(usd_listings(20), &Currency::eur()).await;

        assert_eq!(provider.fetch_count("USD"), 1);
        assert_eq!(batch.converted_count(), 20);
        assert!(batch.partial_failure().is_none());

        let first = batch.listings[0].converted.as_ref().unwrap();
        assert!((first.min - 45_000.0).abs() < 1e-9);
        assert!((first.max - 63_000.0).abs() < 1e-9);
        assert_eq!(first.currency, Currency::eur());
        assert_eq!(first.freshness, Freshness::Live);
    }

    #[tokio::test]
    async fn test_second_batch_is_served_from_cache() {
        let (provider, normalizer) = setup();

        normalizer.normalize(usd_listings(5), &Currency::eur()).await;
        let batch = normalizer.normalize(usd_listings(5), &Currency::gbp()).await;

        assert_eq!(provider.fetch_count("USD"), 1);
        let converted = batch.listings[0].converted.as_ref().unwrap();
        assert_eq!(converted.freshness, Freshness::FreshCached);
        assert!((converted.min - 40_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_same_currency_passes_through() {
        let (provider, normalizer) = setup();

        let batch = normalizer.normalize(usd_listings(3), &Currency::usd()).await;

        assert_eq!(provider.total_fetches(), 0);
        assert!(batch
            .listings
            .iter()
            .all(|l| l.converted.is_none() && l.warning.is_none()));
        assert_eq!(batch.listings[2].listing, usd_listings(3)[2]);
    }

    #[tokio::test]
    async fn test_listing_without_both_bounds_is_not_converted() {
        let (_, normalizer) = setup();
        let mut listings = usd_listings(2);
        listings[1].salary_max = None;

        let batch = normalizer.normalize(listings, &Currency::eur()).await;

        assert!(batch.listings[0].converted.is_some());
        assert!(batch.listings[1].converted.is_none());
        assert!(batch.listings[1].warning.is_none());
    }

    #[tokio::test]
    async fn test_unconvertible_listing_is_contained() {
        let (provider, normalizer) = setup();
        let mut listings = usd_listings(20);
        // GBP table has no EUR rate.
        listings[6].currency = Currency::gbp();

        let batch = normalizer.normalize(listings, &Currency::eur()).await;

        assert_eq!(batch.listings.len(), 20);
        assert_eq!(batch.converted_count(), 19);
        assert!(batch.listings[6].converted.is_none());
        assert!(matches!(
            batch.listings[6].warning,
            Some(ListingWarning::ConversionFailed { .. })
        ));
        assert_eq!(
            batch.partial_failure(),
            Some(PartialBatchFailure {
                failed: vec![6],
                total: 20
            })
        );
        assert_eq!(provider.fetch_count("USD"), 1);
        assert_eq!(provider.fetch_count("GBP"), 1);
    }

    #[tokio::test]
    async fn test_unavailable_base_is_contained() {
        let (provider, normalizer) = setup();
        let mut listings = usd_listings(4);
        listings[1].currency = Currency::new("CHF");
        listings[3].currency = Currency::new("CHF");

        let batch = normalizer.normalize(listings, &Currency::eur()).await;

        assert_eq!(batch.converted_count(), 2);
        assert_eq!(batch.partial_failure().unwrap().failed, vec![1, 3]);
        assert!(matches!(
            batch.listings[3].warning,
            Some(ListingWarning::RateLookupFailed { ref base, .. }) if base.code() == "CHF"
        ));
        assert_eq!(provider.fetch_count("CHF"), 1);
    }

    #[tokio::test]
    async fn test_provider_outage_on_cold_cache_leaves_batch_unconverted() {
        let (provider, normalizer) = setup();
        provider.set_failing(true);

        let batch = normalizer.normalize(usd_listings(5), &Currency::eur()).await;

        assert_eq!(batch.listings.len(), 5);
        assert_eq!(batch.converted_count(), 0);
        assert_eq!(batch.partial_failure().unwrap().failed.len(), 5);
        assert_eq!(provider.fetch_count("USD"), 1);
    }

    #[tokio::test]
    async fn test_stale_rates_are_flagged() {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_rates("USD", &[("EUR", 0.9)], "2024-01-15");
        let config = FxEngineConfig {
            cache: RateCacheConfig {
                ttl: Duration::from_millis(20),
            },
        };
        let normalizer = SalaryNormalizer::new(Arc::new(FxEngine::new(provider.clone(), config)));

        normalizer.normalize(usd_listings(1), &Currency::eur()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        provider.set_failing(true);

        let batch = normalizer.normalize(usd_listings(2), &Currency::eur()).await;

        assert_eq!(batch.converted_count(), 2);
        assert!(batch.partial_failure().is_none());
        assert!(matches!(
            batch.listings[0].warning,
            Some(ListingWarning::StaleRates { .. })
        ));
        assert_eq!(
            batch.listings[1].converted.as_ref().unwrap().freshness,
            Freshness::StaleFallback
        );
    }

    #[tokio::test]
    async fn test_mixed_bases_preserve_order() {
        let (provider, normalizer) = setup();
        provider.set_delay(Duration::from_millis(10));
        let mut listings = usd_listings(6);
        for listing in listings.iter_mut().step_by(2) {
            listing.currency = Currency::gbp();
        }
        let expected: Vec<String> = listings.iter().map(|l| l.id.clone()).collect();

        let batch = normalizer.normalize(listings, &Currency::usd()).await;

        assert_eq!(ids(&batch), expected);
        // Only the GBP listings needed conversion into USD.
        assert_eq!(batch.converted_count(), 3);
        assert_eq!(provider.fetch_count("GBP"), 1);
        assert_eq!(provider.fetch_count("USD"), 0);
    }

    #[test]
    fn test_formatted_salary() {
        let salary = ConvertedSalary {
            min: 45_000.0,
            max: 63_000.5,
            currency: Currency::eur(),
            rate: 0.9,
            source_date: "2024-01-15".to_string(),
            freshness: Freshness::Live,
        };
        assert_eq!(salary.formatted(), "€45,000.00 – €63,000.50");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_output_order_matches_input(currencies in prop::collection::vec(0usize..4, 1..30)) {
            let codes = ["USD", "GBP", "EUR", "CHF"];
            let listings: Vec<Listing> = currencies
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    Listing::new(format!("job-{}", i), "Job", Currency::new(codes[*c]))
                        .with_salary(1_000.0, 2_000.0)
                })
                .collect();
            let expected: Vec<String> = listings.iter().map(|l| l.id.clone()).collect();

            let runtime = tokio::runtime::Runtime::new().unwrap();
            let batch = runtime.block_on(async {
                let (provider, normalizer) = setup();
                provider.set_delay(Duration::from_millis(1));
                normalizer.normalize(listings, &Currency::eur()).await
            });

            prop_assert_eq!(ids(&batch), expected);
        }
    }
}
