//! Time utilities and constants for SalaryFX.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched rate table is served without refreshing (1 hour).
    pub const DEFAULT_RATE_TTL: Duration = Duration::from_millis(3_600_000);

    /// Upstream HTTP request timeout (10 seconds).
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
}

/// A wall-clock timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_is_one_hour() {
        assert_eq!(constants::DEFAULT_RATE_TTL, Duration::from_secs(60 * 60));
    }
}
