//! Listing source boundary.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ListingError;
use crate::listing::Listing;

/// A job search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Two-letter country code of the job board, lower case.
    pub country: String,
    /// Free-text keywords.
    pub what: String,
    /// Free-text location.
    pub location: String,
    /// 1-based page number.
    pub page: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            what: String::new(),
            location: String::new(),
            page: 1,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchPage {
    /// Listings on this page, in source order.
    pub listings: Vec<Listing>,
    /// Total matches across all pages.
    pub count: u64,
    /// Mean advertised salary across all matches, in the native currency.
    pub mean_salary: Option<f64>,
}

/// Source of job listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch one page of listings.
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ListingError>;
}
