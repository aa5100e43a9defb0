//! SalaryFX Jobs
//!
//! Job listings, the listing-source boundary with its Adzuna client, and
//! batch salary normalization into a display currency.

pub mod adzuna;
pub mod error;
pub mod listing;
pub mod normalizer;
pub mod source;

pub use adzuna::{AdzunaClient, AdzunaConfig};
pub use error::{ListingError, ListingWarning, PartialBatchFailure};
pub use listing::Listing;
pub use normalizer::{ConvertedSalary, NormalizedBatch, NormalizedListing, SalaryNormalizer};
pub use source::{ListingSource, SearchPage, SearchQuery};
