#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fetches recent NYC motor vehicle collisions and writes them to a CSV
//! table.
//!
//! A run is a fixed sequence: build the `SoQL` query, fetch the records,
//! load them into a [`CollisionTable`], optionally [`transform::process`]
//! them into the short-name schema, and [`output::write_csv`] the result.
//! The output file is only replaced when every stage succeeds.

pub mod output;
pub mod summary;
pub mod table;
pub mod transform;

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use nyc_collisions_source::socrata::NYC_COLLISIONS_DATE_COLUMN;
use nyc_collisions_source::soql::SoqlQuery;
use nyc_collisions_source::{CollisionSource, FetchOptions, SourceError};

use crate::summary::RetrievalSummary;
use crate::table::CollisionTable;

/// Maximum number of records requested per run.
pub const DEFAULT_LIMIT: u64 = 1000;

/// Largest cutoff window accepted on the command line, in days.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Errors that can occur during an ingest run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Fetching from the data source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The query matched no records.
    #[error("No data retrieved!")]
    NoData,

    /// A casualty count could not be read as a whole number.
    #[error("Invalid {column} count: {value}")]
    InvalidCount {
        /// Short column name of the count.
        column: &'static str,
        /// The offending raw value.
        value: String,
    },

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file write/rename).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which flavour of output a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    /// One year of records, renamed and enriched with derived columns.
    #[default]
    Full,
    /// One week of records, written with the dataset's own columns.
    Abbreviated,
}

impl Variant {
    /// Default cutoff window in days.
    #[must_use]
    pub const fn window_days(self) -> u32 {
        match self {
            Self::Full => 365,
            Self::Abbreviated => 7,
        }
    }

    /// Whether the transformation stage runs.
    #[must_use]
    pub const fn transforms(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Parameters of a single run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Output flavour.
    pub variant: Variant,
    /// Overrides the variant's cutoff window.
    pub window_days: Option<u32>,
    /// Maximum number of records to request.
    pub limit: u64,
    /// Reference time for the cutoff window.
    pub as_of: DateTime<Utc>,
}

impl IngestOptions {
    /// Options for `variant` with its default window, measured from `as_of`.
    #[must_use]
    pub const fn new(variant: Variant, as_of: DateTime<Utc>) -> Self {
        Self {
            variant,
            window_days: None,
            limit: DEFAULT_LIMIT,
            as_of,
        }
    }

    /// Returns the source fetch options these parameters describe.
    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            as_of: self.as_of,
            window_days: self.window_days.unwrap_or_else(|| self.variant.window_days()),
            limit: self.limit,
        }
    }

    /// Returns the query sent to the collisions dataset.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Source`] if the cutoff window is out of range.
    pub fn query(&self) -> Result<SoqlQuery, IngestError> {
        Ok(SoqlQuery::from_options(
            NYC_COLLISIONS_DATE_COLUMN,
            &self.fetch_options(),
        )?)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Summary of the fetched records.
    pub summary: RetrievalSummary,
    /// Number of data rows written.
    pub rows_written: usize,
    /// Where the table was written.
    pub output_path: PathBuf,
}

/// Fetches records for `options` and loads them into a table.
///
/// # Errors
///
/// Returns [`IngestError::NoData`] if the query matched nothing, or
/// [`IngestError::Source`] if the query could not be built or the fetch
/// failed.
pub async fn fetch_table(
    source: &dyn CollisionSource,
    options: &IngestOptions,
) -> Result<CollisionTable, IngestError> {
    let query = options.query()?;
    log::info!(
        "Fetching from {} ({}) since {}",
        source.name(),
        source.id(),
        query.since_date()
    );

    let records = source.fetch(&query).await?;
    if records.is_empty() {
        return Err(IngestError::NoData);
    }

    Ok(CollisionTable::from_records(records))
}

/// Runs the whole pipeline and writes the result to `output_path`.
///
/// # Errors
///
/// Returns [`IngestError`] if any stage fails. Nothing is written in that
/// case.
pub async fn run(
    source: &dyn CollisionSource,
    options: &IngestOptions,
    output_path: &Path,
) -> Result<RunReport, IngestError> {
    let start = Instant::now();

    let table = fetch_table(source, options).await?;
    let summary = RetrievalSummary::from_table(&table);
    log::debug!("{summary}");

    let table = if options.variant.transforms() {
        transform::process(&table)?
    } else {
        table
    };

    output::write_csv(&table, output_path)?;

    log::info!(
        "{} run finished in {:.1}s",
        source.name(),
        start.elapsed().as_secs_f64()
    );

    Ok(RunReport {
        summary,
        rows_written: table.len(),
        output_path: output_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use nyc_collisions_collision_models::PROCESSED_COLUMNS;
    use nyc_collisions_source::RawRecord;
    use serde_json::{Value, json};

    use super::*;

    struct StaticSource {
        records: Vec<RawRecord>,
    }

    impl StaticSource {
        fn new(records: &[Value]) -> Self {
            Self {
                records: records
                    .iter()
                    .filter_map(|r| r.as_object().cloned())
                    .collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl CollisionSource for StaticSource {
        fn id(&self) -> &'static str {
            "static"
        }

        fn name(&self) -> &'static str {
            "Static test source"
        }

        async fn fetch(&self, query: &SoqlQuery) -> Result<Vec<RawRecord>, SourceError> {
            assert_eq!(query.date_column(), "crash_date");
            Ok(self.records.clone())
        }
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap()
    }

    fn temp_output(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nyc_collisions_ingest_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(output::OUTPUT_FILENAME)
    }

    fn sample_records() -> Vec<Value> {
        vec![
            json!({
                "crash_date": "2024-03-04T00:00:00.000",
                "crash_time": "8:15",
                "borough": "BROOKLYN",
                "latitude": "40.66",
                "longitude": "-73.95",
                "location": {"latitude": "40.66", "longitude": "-73.95", "human_address": "{}"},
                "number_of_persons_injured": "0",
                "number_of_persons_killed": "1",
                "contributing_factor_vehicle_1": "Unsafe Speed",
                "vehicle_type_code1": "Sedan",
                "collision_id": "4711111",
            }),
            json!({
                "crash_date": "2024-03-09T00:00:00.000",
                "crash_time": "23:40",
                "number_of_persons_injured": "2",
                "number_of_persons_killed": "0",
                "vehicle_type_code_3": "Bike",
                "collision_id": "4711112",
            }),
            json!({
                "crash_date": "2024-03-10T00:00:00.000",
                "crash_time": "0:05",
                "borough": "QUEENS",
                "number_of_persons_injured": "0",
                "number_of_persons_killed": "0",
                "collision_id": "4711113",
            }),
        ]
    }

    #[test]
    fn variants_pick_window_and_transform() {
        assert_eq!(Variant::Full.window_days(), 365);
        assert!(Variant::Full.transforms());
        assert_eq!(Variant::Abbreviated.window_days(), 7);
        assert!(!Variant::Abbreviated.transforms());
        assert_eq!(Variant::default(), Variant::Full);
    }

    #[test]
    fn builds_query_for_variant() {
        let options = IngestOptions::new(Variant::Abbreviated, as_of());
        assert_eq!(
            options.query().unwrap().to_string(),
            "SELECT * WHERE crash_date >= '2024-03-04' ORDER BY crash_date DESC LIMIT 1000"
        );

        let mut options = IngestOptions::new(Variant::Full, as_of());
        options.window_days = Some(30);
        assert!(
            options
                .query()
                .unwrap()
                .to_string()
                .contains(">= '2024-02-10'")
        );
    }

    #[tokio::test]
    async fn full_run_writes_processed_table() {
        let path = temp_output("full");
        let source = StaticSource::new(&sample_records());
        let options = IngestOptions::new(Variant::Full, as_of());

        let report = run(&source, &options, &path).await.unwrap();
        assert_eq!(report.rows_written, 3);
        assert_eq!(report.summary.record_count, 3);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, PROCESSED_COLUMNS);

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        let col = |name: &str| PROCESSED_COLUMNS.iter().position(|c| *c == name).unwrap();

        assert_eq!(&rows[0][col("severity")], "lethal");
        assert_eq!(&rows[0][col("weekday")], "1");
        assert_eq!(&rows[0][col("hour")], "8");
        assert_eq!(&rows[0][col("dtime")], "2024-03-04 08:15:00");
        assert_eq!(&rows[0][col("cFactor1")], "Unsafe Speed");
        assert_eq!(&rows[1][col("severity")], "injured");
        assert_eq!(&rows[1][col("weekday")], "6");
        assert_eq!(&rows[1][col("borough")], "");
        assert_eq!(&rows[1][col("vType3")], "Bike");
        assert_eq!(&rows[2][col("severity")], "nohurt");
        assert_eq!(&rows[2][col("weekday")], "7");
        assert_eq!(&rows[2][col("hour")], "0");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn abbreviated_run_keeps_raw_columns() {
        let path = temp_output("abbreviated");
        let source = StaticSource::new(&sample_records());
        let options = IngestOptions::new(Variant::Abbreviated, as_of());

        run(&source, &options, &path).await.unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers[0], "crash_date");
        assert!(headers.iter().any(|h| h == "collision_id"));
        assert!(headers.iter().any(|h| h == "vehicle_type_code_3"));
        assert!(!headers.iter().any(|h| h == "severity"));

        let location = headers.iter().position(|h| h == "location").unwrap();
        let first = reader.records().next().unwrap().unwrap();
        let text = &first[location];
        assert!(text.starts_with('{'));
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["latitude"], "40.66");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn empty_result_fails_and_keeps_previous_output() {
        let path = temp_output("empty");
        std::fs::write(&path, "previous\n").unwrap();
        let source = StaticSource::new(&[]);
        let options = IngestOptions::new(Variant::Full, as_of());

        let err = run(&source, &options, &path).await.unwrap_err();
        assert!(matches!(err, IngestError::NoData));
        assert_eq!(err.to_string(), "No data retrieved!");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");
    }

    #[tokio::test]
    async fn empty_result_writes_nothing() {
        let path = temp_output("empty_fresh");
        let source = StaticSource::new(&[]);
        let options = IngestOptions::new(Variant::Abbreviated, as_of());

        assert!(run(&source, &options, &path).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn out_of_range_window_fails_before_fetching() {
        let path = temp_output("bad_window");
        std::fs::write(&path, "previous\n").unwrap();
        let source = StaticSource::new(&sample_records());
        let mut options = IngestOptions::new(Variant::Full, as_of());
        options.window_days = Some(u32::MAX);

        let err = run(&source, &options, &path).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Source(SourceError::InvalidWindow { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");
    }

    #[test]
    fn max_window_is_representable() {
        let mut options = IngestOptions::new(Variant::Full, as_of());
        options.window_days = Some(MAX_WINDOW_DAYS);
        assert!(options.query().is_ok());
    }

    #[tokio::test]
    async fn transform_failure_leaves_previous_output() {
        let path = temp_output("bad_count");
        std::fs::write(&path, "previous\n").unwrap();
        let source = StaticSource::new(&[json!({
            "crash_date": "2024-03-04T00:00:00.000",
            "number_of_persons_killed": "many",
        })]);
        let options = IngestOptions::new(Variant::Full, as_of());

        let err = run(&source, &options, &path).await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidCount { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");
    }
}
