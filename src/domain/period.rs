//! Challenge periods (month + year) derived from Unix millisecond timestamps

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A calendar month a challenge runs in.
///
/// Fields are declared year first so the derived ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    /// Period containing the given timestamp (UTC).
    ///
    /// # Example
    /// ```
    /// use challenge_board::domain::Period;
    /// let p = Period::from_timestamp_ms(1703766896000); // 2023-12-28
    /// assert_eq!(p, Period::new(12, 2023));
    /// ```
    pub fn from_timestamp_ms(timestamp_ms: i64) -> Self {
        let dt = DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_else(Utc::now);
        Self {
            month: dt.month(),
            year: dt.year(),
        }
    }

    /// The period we are in right now
    pub fn current() -> Self {
        Self::from_timestamp_ms(now_ms())
    }

    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
    }

    /// Storage/display label, "YYYY-MM"
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
