//! RowKey range queries
//!
//! RowKeys are time-ordered, so a time bound is a RowKey bound. Bound strings
//! are forwarded verbatim; the store is the one to reject malformed ones.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use stirling_common::error::{Error, Result};

/// Columns every fix query selects
pub const FIX_COLUMNS: &[&str] = &[
    "RowKey",
    "Timestamp",
    "lat",
    "lon",
    "velocity",
    "accuracy",
    "x",
    "y",
    "z",
    "temp",
    "voltage",
    "windspeed",
    "winddir",
    "depth",
];

/// Inclusive RowKey predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKeyBound {
    /// RowKey >= value
    AtLeast(String),
    /// RowKey <= value
    AtMost(String),
}

impl RowKeyBound {
    #[must_use]
    pub fn matches(&self, row_key: &str) -> bool {
        match self {
            RowKeyBound::AtLeast(low) => row_key >= low.as_str(),
            RowKeyBound::AtMost(high) => row_key <= high.as_str(),
        }
    }
}

/// Caller's choice of time bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeBound {
    Since(String),
    Before(String),
    /// Trailing window ending now
    Recent,
}

impl TimeBound {
    /// Build from optional request parameters.
    ///
    /// Empty values count as absent. Supplying both bounds is rejected.
    pub fn from_params(since: Option<String>, before: Option<String>) -> Result<Self> {
        let since = since.filter(|s| !s.is_empty());
        let before = before.filter(|s| !s.is_empty());

        match (since, before) {
            (Some(_), Some(_)) => Err(Error::InvalidRequest(
                "`since` and `before` are mutually exclusive".to_string(),
            )),
            (Some(since), None) => Ok(TimeBound::Since(since)),
            (None, Some(before)) => Ok(TimeBound::Before(before)),
            (None, None) => Ok(TimeBound::Recent),
        }
    }
}

/// Immutable column selection plus RowKey bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    columns: Vec<String>,
    bound: RowKeyBound,
}

impl Query {
    /// Query over the full fix column set
    #[must_use]
    pub fn new(bound: RowKeyBound) -> Self {
        Self {
            columns: FIX_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            bound,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn bound(&self) -> &RowKeyBound {
        &self.bound
    }
}

/// Turns a [`TimeBound`] into a [`Query`]
#[derive(Debug, Clone, Copy)]
pub struct RangeQueryBuilder {
    default_window: Duration,
}

impl RangeQueryBuilder {
    #[must_use]
    pub fn new(default_window: Duration) -> Self {
        Self { default_window }
    }

    #[must_use]
    pub fn build(&self, bound: TimeBound) -> Query {
        self.build_at(bound, Utc::now())
    }

    /// Build with an explicit notion of "now"
    #[must_use]
    pub fn build_at(&self, bound: TimeBound, now: DateTime<Utc>) -> Query {
        let bound = match bound {
            TimeBound::Since(since) => RowKeyBound::AtLeast(since),
            TimeBound::Before(before) => RowKeyBound::AtMost(before),
            TimeBound::Recent => RowKeyBound::AtLeast(format_cursor(self.window_start(now))),
        };

        Query::new(bound)
    }

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.default_window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// RowKey form of a timestamp: ISO-8601, millisecond precision, `Z` suffix
#[must_use]
pub fn format_cursor(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
