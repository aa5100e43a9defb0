//! Adzuna job search API client
//!
//! Fetches pages of listings from `GET {base}/{country}/search/{page}` and maps
//! them onto [`Listing`]. Salaries are reported in one fixed native currency.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use salaryfx_common::{constants, Currency};
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

use crate::error::ListingError;
use crate::listing::Listing;
use crate::source::{ListingSource, SearchPage, SearchQuery};

/// Base URL for the Adzuna jobs API
pub const ADZUNA_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";

/// Configuration for [`AdzunaClient`].
#[derive(Debug, Clone)]
pub struct AdzunaConfig {
    pub base_url: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub results_per_page: u32,
    /// Currency the API reports salaries in.
    pub native_currency: Currency,
    pub timeout: Duration,
}

impl Default for AdzunaConfig {
    fn default() -> Self {
        Self {
            base_url: ADZUNA_BASE_URL.to_string(),
            app_id: None,
            app_key: None,
            results_per_page: 20,
            native_currency: Currency::usd(),
            timeout: constants::DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl AdzunaConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Adzuna base URL cannot be empty".to_string());
        }

        if !(1..=50).contains(&self.results_per_page) {
            return Err(format!(
                "Results per page must be between 1 and 50, got {}",
                self.results_per_page
            ));
        }

        Ok(())
    }

    fn credentials(&self) -> Result<(&str, &str), ListingError> {
        let app_id = self
            .app_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ListingError::MissingCredentials("ADZUNA_APP_ID"))?;
        let app_key = self
            .app_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ListingError::MissingCredentials("ADZUNA_APP_KEY"))?;
        Ok((app_id, app_key))
    }
}

/// Client for the Adzuna search API
#[derive(Debug, Clone)]
pub struct AdzunaClient {
    client: Client,
    config: AdzunaConfig,
}

impl AdzunaClient {
    /// Create a client with its own HTTP client.
    pub fn new(config: AdzunaConfig) -> Result<Self, ListingError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create a client around an existing HTTP client.
    pub fn with_client(client: Client, config: AdzunaConfig) -> Self {
        Self { client, config }
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        format!(
            "{}/{}/search/{}",
            self.config.base_url.trim_end_matches('/'),
            query.country.to_lowercase(),
            query.page.max(1)
        )
    }
}

#[async_trait]
impl ListingSource for AdzunaClient {
    fn name(&self) -> &str {
        "adzuna"
    }

    #[instrument(skip(self), fields(country = %query.country, page = query.page))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ListingError> {
        let (app_id, app_key) = self.config.credentials()?;
        let results_per_page = self.config.results_per_page.to_string();

        let response = self
            .client
            .get(self.search_url(query))
            .query(&[
                ("app_id", app_id),
                ("app_key", app_key),
                ("results_per_page", results_per_page.as_str()),
                ("what", query.what.as_str()),
                ("where", query.location.as_str()),
                ("content-type", "application/json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ListingError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let page = parse_search_response(&body, &self.config.native_currency)?;

        debug!(listings = page.listings.len(), count = page.count, "Fetched listings");
        Ok(page)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
    #[serde(default)]
    count: u64,
    mean: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    title: String,
    company: Option<DisplayName>,
    location: Option<DisplayName>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    redirect_url: Option<String>,
    created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    display_name: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// Decode an Adzuna search response body.
pub fn parse_search_response(body: &str, native: &Currency) -> Result<SearchPage, ListingError> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let listings = response
        .results
        .into_iter()
        .map(|job| Listing {
            id: job.id,
            title: job.title,
            company: job.company.and_then(|c| c.display_name),
            location: job.location.and_then(|l| l.display_name),
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            currency: native.clone(),
            redirect_url: job.redirect_url,
            created: job.created.and_then(|created| created.parse().ok()),
        })
        .collect();

    Ok(SearchPage {
        listings,
        count: response.count,
        mean_salary: response.mean,
    })
}
