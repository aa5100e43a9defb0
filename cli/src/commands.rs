//! Command handlers.

use std::sync::Arc;

use anyhow::Context;
use salaryfx_common::{format_amount, popular_currencies, Currency};
use salaryfx_fx::{FxEngine, HttpRateProvider};
use salaryfx_jobs::{
    AdzunaClient, ListingSource, NormalizedBatch, SalaryNormalizer, SearchPage, SearchQuery,
};
use serde_json::json;
use tracing::info;

use crate::cli::Command;
use crate::config::AppConfig;

/// Run a parsed command.
pub async fn run(command: Command, config: &AppConfig, as_json: bool) -> anyhow::Result<()> {
    match command {
        Command::Currencies => currencies(as_json),
        Command::Convert { amount, from, to } => {
            let engine = build_engine(config)?;
            convert(&engine, amount, &from, &to, as_json).await
        }
        Command::Rates { base } => {
            let engine = build_engine(config)?;
            rates(&engine, &base, as_json).await
        }
        Command::Search {
            query,
            location,
            country,
            page,
            currency,
        } => {
            let engine = Arc::new(build_engine(config)?);
            let source = AdzunaClient::new(config.adzuna.clone())
                .context("Failed to build listing client")?;
            let query = SearchQuery {
                country,
                what: query,
                location,
                page,
            };
            let native = &config.adzuna.native_currency;
            search(engine, &source, &query, &currency, native, as_json).await
        }
    }
}

fn build_engine(config: &AppConfig) -> anyhow::Result<FxEngine> {
    let provider = HttpRateProvider::new(config.rates.clone())
        .context("Failed to build rate provider")?;
    Ok(FxEngine::new(Arc::new(provider), config.engine.clone()))
}

fn currencies(as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(popular_currencies())?);
        return Ok(());
    }

    for info in popular_currencies() {
        println!("{}  {:<4} {}", info.code, info.symbol, info.name);
    }
    Ok(())
}

async fn convert(
    engine: &FxEngine,
    amount: f64,
    from: &Currency,
    to: &Currency,
    as_json: bool,
) -> anyhow::Result<()> {
    let outcome = engine.convert_detailed(amount, from, to).await?;
    let result = &outcome.result;

    if as_json {
        let body = json!({
            "original": {
                "amount": result.original_amount,
                "currency": result.original_currency,
                "formatted": result.formatted_original(),
            },
            "converted": {
                "amount": result.converted_amount,
                "currency": result.converted_currency,
                "formatted": result.formatted_converted(),
            },
            "rate": result.rate,
            "date": result.source_date,
            "freshness": outcome.freshness,
            "warning": outcome.warning,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!(
        "{} = {}",
        result.formatted_original(),
        result.formatted_converted()
    );
    println!(
        "1 {} = {} {} (rates of {})",
        result.original_currency, result.rate, result.converted_currency, result.source_date
    );
    if let Some(warning) = &outcome.warning {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

async fn rates(engine: &FxEngine, base: &Currency, as_json: bool) -> anyhow::Result<()> {
    let lookup = engine.rates(base).await?;

    let mut rows: Vec<(&Currency, &f64)> = lookup.table.rates().iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    if as_json {
        let body = json!({
            "base": lookup.table.base,
            "date": lookup.table.source_date,
            "freshness": lookup.freshness,
            "rates": rows
                .iter()
                .map(|(code, rate)| (code.to_string(), json!(**rate)))
                .collect::<serde_json::Map<_, _>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Rates for 1 {} ({})", lookup.table.base, lookup.table.source_date);
    for (code, rate) in rows {
        println!("{:<4} {}", code, rate);
    }
    if let Some(warning) = &lookup.warning {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

async fn search(
    engine: Arc<FxEngine>,
    source: &dyn ListingSource,
    query: &SearchQuery,
    target: &Currency,
    native: &Currency,
    as_json: bool,
) -> anyhow::Result<()> {
    let page = source.search(query).await?;
    info!(source = source.name(), listings = page.listings.len(), "Search completed");

    let SearchPage {
        listings,
        count,
        mean_salary,
    } = page;
    let batch = SalaryNormalizer::new(engine).normalize(listings, target).await;

    if as_json {
        let body = json!({
            "count": count,
            "mean_salary": mean_salary,
            "native_currency": native,
            "batch": batch,
            "partial_failure": batch.partial_failure(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    print_batch(&batch, count, mean_salary, native);
    Ok(())
}

fn print_batch(batch: &NormalizedBatch, count: u64, mean_salary: Option<f64>, native: &Currency) {
    match mean_salary {
        Some(mean) => println!(
            "Found {} jobs (average salary {})",
            count,
            format_amount(mean, native)
        ),
        None => println!("Found {} jobs", count),
    }

    for (position, entry) in batch.listings.iter().enumerate() {
        let listing = &entry.listing;
        let mut heading = format!("{:>2}. {}", position + 1, listing.title);
        if let Some(company) = &listing.company {
            heading.push_str(&format!(" | {}", company));
        }
        if let Some(location) = &listing.location {
            heading.push_str(&format!(" | {}", location));
        }
        println!("{}", heading);

        if let Some((min, max)) = listing.salary_range() {
            let native_range = format!(
                "{} – {}",
                format_amount(min, &listing.currency),
                format_amount(max, &listing.currency)
            );
            match &entry.converted {
                Some(converted) => println!("    {} (≈ {})", native_range, converted.formatted()),
                None => println!("    {}", native_range),
            }
        }

        if let Some(warning) = &entry.warning {
            println!("    ! {}", warning);
        }
    }

    if let Some(failure) = batch.partial_failure() {
        eprintln!("warning: {}", failure);
    }
}
