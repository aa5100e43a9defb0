//! Job listing types.

use salaryfx_common::{Currency, Timestamp};
use serde::{Deserialize, Serialize};

/// A job listing as returned by a listing source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Source-assigned listing ID.
    pub id: String,
    /// Job title.
    pub title: String,
    /// Hiring company display name.
    pub company: Option<String>,
    /// Location display name.
    pub location: Option<String>,
    /// Lower salary bound, in `currency`.
    pub salary_min: Option<f64>,
    /// Upper salary bound, in `currency`.
    pub salary_max: Option<f64>,
    /// Native currency of the salary bounds.
    pub currency: Currency,
    /// Link to the full posting.
    pub redirect_url: Option<String>,
    /// When the listing was posted.
    pub created: Option<Timestamp>,
}

impl Listing {
    /// Create a listing with just an ID, title and native currency.
    pub fn new(id: impl Into<String>, title: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company: None,
            location: None,
            salary_min: None,
            salary_max: None,
            currency,
            redirect_url: None,
            created: None,
        }
    }

    /// Set both salary bounds.
    pub fn with_salary(mut self, min: f64, max: f64) -> Self {
        self.salary_min = Some(min);
        self.salary_max = Some(max);
        self
    }

    /// Set the company.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Both salary bounds, if the listing has a complete range.
    pub fn salary_range(&self) -> Option<(f64, f64)> {
        Some((self.salary_min?, self.salary_max?))
    }
}
