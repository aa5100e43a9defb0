//! SalaryFX Common Types
//!
//! Shared types used across SalaryFX: currency codes, the static currency
//! metadata table, display formatting and time helpers.

pub mod currency;
pub mod error;
pub mod metadata;
pub mod time;

pub use currency::*;
pub use error::*;
pub use metadata::*;
pub use time::*;
