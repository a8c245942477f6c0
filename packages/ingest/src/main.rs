#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the NYC collisions fetcher.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::Parser;
use nyc_collisions_ingest::output::default_output_path;
use nyc_collisions_ingest::{
    DEFAULT_LIMIT, IngestError, IngestOptions, MAX_WINDOW_DAYS, RunReport, Variant, run,
};
use nyc_collisions_source::socrata::{SocrataConfig, SocrataSource};

#[derive(Parser)]
#[command(
    name = "nyc_collisions_ingest",
    about = "Fetch recent NYC motor vehicle collisions into a CSV table"
)]
struct Cli {
    /// Output flavour: a year of processed records or a week of raw ones
    #[arg(long, value_enum, default_value_t = Variant::Full)]
    variant: Variant,
    /// Override the number of days before `--as-of` to include
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
    days: Option<u32>,
    /// Maximum number of records to request
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u64,
    /// Reference time for the cutoff window (RFC 3339, defaults to now)
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,
    /// Where to write the table (defaults to the project root)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Prints the outcome of a run and returns the process exit status.
///
/// Success prints the summary and the output path to `out`; failure prints
/// `Error: <message>` to `err` and returns status 1.
fn report(
    result: Result<RunReport, IngestError>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> u8 {
    match result {
        Ok(report) => {
            let _ = writeln!(out, "{}", report.summary);
            let _ = writeln!(out, "Data saved to {}", report.output_path.display());
            0
        }
        Err(e) => {
            log::error!("Ingest failed: {e}");
            let _ = writeln!(err, "Error: {e}");
            1
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let options = IngestOptions {
        variant: cli.variant,
        window_days: cli.days,
        limit: cli.limit,
        as_of: cli.as_of.unwrap_or_else(Utc::now),
    };
    let output = cli.output.unwrap_or_else(default_output_path);

    let source = SocrataSource::new(SocrataConfig::nyc_collisions());
    if let Some(portal) = source.config().portal_url() {
        log::debug!("Dataset page: {portal}");
    }

    let result = run(&source, &options, &output).await;
    ExitCode::from(report(
        result,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    ))
}
