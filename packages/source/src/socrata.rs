//! Socrata SODA API fetcher.
//!
//! Sends a single `$query` request to a Socrata resource endpoint and
//! returns the response rows. No pagination and no retries: the query's
//! `LIMIT` bounds the result, and any failure is reported to the caller.

use async_trait::async_trait;

use crate::soql::SoqlQuery;
use crate::{CollisionSource, RawRecord, SourceError};

/// NYC Open Data "Motor Vehicle Collisions - Crashes" resource endpoint.
pub const NYC_COLLISIONS_API_URL: &str = "https://data.cityofnewyork.us/resource/h9gi-nx95.json";

/// Date column of the collisions dataset used for filtering and ordering.
pub const NYC_COLLISIONS_DATE_COLUMN: &str = "crash_date";

/// Environment variable holding an optional Socrata application token.
pub const APP_TOKEN_ENV: &str = "SOCRATA_APP_TOKEN";

/// Configuration for a Socrata source.
#[derive(Debug, Clone)]
pub struct SocrataConfig {
    /// Resource URL (e.g., `"https://data.cityofnewyork.us/resource/h9gi-nx95.json"`).
    pub api_url: String,
    /// Unique source identifier.
    pub id: String,
    /// Label for log messages.
    pub label: String,
    /// Application token sent as `X-App-Token`. `None` requests anonymously.
    pub app_token: Option<String>,
}

impl SocrataConfig {
    /// Configuration for the NYC motor vehicle collisions dataset.
    ///
    /// Picks up an application token from [`APP_TOKEN_ENV`] when set.
    #[must_use]
    pub fn nyc_collisions() -> Self {
        Self {
            api_url: NYC_COLLISIONS_API_URL.to_string(),
            id: "nyc_collisions".to_string(),
            label: "NYPD Motor Vehicle Collisions".to_string(),
            app_token: std::env::var(APP_TOKEN_ENV)
                .ok()
                .filter(|token| !token.trim().is_empty()),
        }
    }

    /// Derives the human-readable dataset page from the resource URL.
    ///
    /// `/resource/{id}.json` becomes `/d/{id}`.
    #[must_use]
    pub fn portal_url(&self) -> Option<String> {
        // https://data.cityofnewyork.us/resource/h9gi-nx95.json
        // -> https://data.cityofnewyork.us/d/h9gi-nx95
        self.api_url.find("/resource/").map(|idx| {
            let base = &self.api_url[..idx];
            let rest = &self.api_url[idx + "/resource/".len()..];
            let dataset_id = rest.strip_suffix(".json").unwrap_or(rest);
            format!("{base}/d/{dataset_id}")
        })
    }
}

/// A [`CollisionSource`] backed by a Socrata resource endpoint.
pub struct SocrataSource {
    config: SocrataConfig,
    client: reqwest::Client,
}

impl SocrataSource {
    /// Creates a source for `config` with a default HTTP client.
    #[must_use]
    pub fn new(config: SocrataConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Returns the source configuration.
    #[must_use]
    pub const fn config(&self) -> &SocrataConfig {
        &self.config
    }
}

#[async_trait]
impl CollisionSource for SocrataSource {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.config.label
    }

    async fn fetch(&self, query: &SoqlQuery) -> Result<Vec<RawRecord>, SourceError> {
        let soql = query.to_string();
        log::info!("Fetching {} data: {soql}", self.config.label);
        if self.config.app_token.is_none() {
            log::warn!(
                "Requests made without an app token will be subject to strict throttling limits"
            );
        }

        let mut request = self
            .client
            .get(&self.config.api_url)
            .query(&[("$query", soql.as_str())]);
        if let Some(token) = &self.config.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status,
                url: response.url().to_string(),
            });
        }

        let text = response.text().await?;
        log::debug!("Received {} bytes from {}", text.len(), self.config.api_url);
        let body: serde_json::Value = serde_json::from_str(&text)?;
        let records = records_from_body(body)?;

        log::info!(
            "Downloaded {} {} records",
            records.len(),
            self.config.label
        );
        Ok(records)
    }
}

/// Interprets a SODA response body as a list of records.
///
/// # Errors
///
/// Returns [`SourceError::UnexpectedResponse`] if the body is not a JSON
/// array or any element is not an object.
pub fn records_from_body(body: serde_json::Value) -> Result<Vec<RawRecord>, SourceError> {
    let items = match body {
        serde_json::Value::Array(items) => items,
        other => {
            let message = other
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map_or_else(
                    || "expected a JSON array of records".to_string(),
                    |msg| format!("expected a JSON array of records, got error: {msg}"),
                );
            return Err(SourceError::UnexpectedResponse { message });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::Object(record) => Ok(record),
            other => Err(SourceError::UnexpectedResponse {
                message: format!("record {i} is not an object: {other}"),
            }),
        })
        .collect()
}
