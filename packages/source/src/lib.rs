#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision data source trait and the Socrata SODA fetcher.
//!
//! A [`CollisionSource`] turns a [`SoqlQuery`](soql::SoqlQuery) into a list
//! of raw JSON records. The production implementation is
//! [`SocrataSource`](socrata::SocrataSource); tests substitute in-memory
//! sources.

pub mod parsing;
pub mod socrata;
pub mod soql;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::soql::SoqlQuery;

/// A single record as returned by the dataset: field name to JSON value,
/// in the order the API emitted the fields.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: reqwest::StatusCode,
        /// Requested URL.
        url: String,
    },

    /// The response body was valid JSON but not a list of records.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of what went wrong.
        message: String,
    },

    /// The cutoff window reaches past the earliest representable date.
    #[error("Window of {window_days} days before {as_of} is out of range")]
    InvalidWindow {
        /// Requested window length.
        window_days: u32,
        /// Reference time the window was measured from.
        as_of: DateTime<Utc>,
    },
}

/// Configuration for a single fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Reference time the cutoff window is measured back from.
    pub as_of: DateTime<Utc>,
    /// Number of days before `as_of` to include.
    pub window_days: u32,
    /// Maximum number of records to request.
    pub limit: u64,
}

impl FetchOptions {
    /// Returns the earliest crash date included by this fetch.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidWindow`] if `window_days` before
    /// `as_of` falls outside the supported date range.
    pub fn cutoff_date(&self) -> Result<NaiveDate, SourceError> {
        TimeDelta::try_days(i64::from(self.window_days))
            .and_then(|window| self.as_of.checked_sub_signed(window))
            .map(|cutoff| cutoff.date_naive())
            .ok_or(SourceError::InvalidWindow {
                window_days: self.window_days,
                as_of: self.as_of,
            })
    }
}

/// Trait that all collision data sources implement.
#[async_trait::async_trait]
pub trait CollisionSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., `"nyc_collisions"`).
    fn id(&self) -> &str;

    /// Returns the human-readable name of this source.
    fn name(&self) -> &str;

    /// Runs `query` against the source and returns the matching records.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the response cannot
    /// be interpreted as a list of records.
    async fn fetch(&self, query: &SoqlQuery) -> Result<Vec<RawRecord>, SourceError>;
}
