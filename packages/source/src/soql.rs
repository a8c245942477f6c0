//! `SoQL` query construction.
//!
//! Builds the `$query` text sent to a Socrata endpoint: every column of
//! the rows whose date column is on or after a cutoff, newest first, with a
//! row cap.

use std::fmt;

use chrono::NaiveDate;

use crate::{FetchOptions, SourceError};

/// A date-filtered, date-ordered, row-capped `SoQL` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoqlQuery {
    date_column: String,
    since: NaiveDate,
    limit: u64,
}

impl SoqlQuery {
    /// Creates a query for rows with `date_column >= since`, capped at
    /// `limit` rows.
    #[must_use]
    pub fn since(date_column: &str, since: NaiveDate, limit: u64) -> Self {
        Self {
            date_column: date_column.to_string(),
            since,
            limit,
        }
    }

    /// Creates a query from the cutoff and limit in `options`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidWindow`] if the cutoff cannot be
    /// computed.
    pub fn from_options(date_column: &str, options: &FetchOptions) -> Result<Self, SourceError> {
        Ok(Self::since(date_column, options.cutoff_date()?, options.limit))
    }

    /// Returns the column used for filtering and ordering.
    #[must_use]
    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    /// Returns the earliest date included.
    #[must_use]
    pub const fn since_date(&self) -> NaiveDate {
        self.since
    }

    /// Returns the row cap.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }
}

impl fmt::Display for SoqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT * WHERE {column} >= '{since}' ORDER BY {column} DESC LIMIT {limit}",
            column = self.date_column,
            since = self.since.format("%Y-%m-%d"),
            limit = self.limit,
        )
    }
}
