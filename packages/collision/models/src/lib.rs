#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Collision severity, output column schema, and per-row derivation
//! functions.
//!
//! Everything in this crate operates on the fields of a single row and has
//! no knowledge of how rows are fetched or written. The ingest pipeline
//! applies these functions row by row when building the processed table.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Three-level outcome label for a collision.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// At least one person was killed.
    Lethal,
    /// Nobody was killed but at least one person was injured.
    Injured,
    /// Nobody was killed or injured.
    NoHurt,
}

impl Severity {
    /// Classifies a collision from its total killed and injured counts.
    ///
    /// A fatality always wins over injuries; non-positive counts are
    /// treated as "none".
    #[must_use]
    pub const fn from_counts(killed: i64, injured: i64) -> Self {
        if killed > 0 {
            Self::Lethal
        } else if injured > 0 {
            Self::Injured
        } else {
            Self::NoHurt
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Lethal, Self::Injured, Self::NoHurt]
    }
}

/// Calendar components derived from a crash timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    /// Four-digit year.
    pub year: i32,
    /// Month of the year, 1-12.
    pub month: u32,
    /// Hour of the day, 0-23.
    pub hour: u32,
    /// Day of the week, 1 (Monday) through 7 (Sunday).
    pub weekday: u32,
}

impl CalendarFields {
    /// Extracts the calendar components of `timestamp`.
    #[must_use]
    pub fn from_timestamp(timestamp: &NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
            hour: timestamp.hour(),
            weekday: timestamp.weekday().number_from_monday(),
        }
    }
}

/// Format used when writing a crash timestamp to the output table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a crash date and a crash time into a single timestamp.
///
/// The date may be a plain `YYYY-MM-DD` or a Socrata floating timestamp
/// (`2024-03-04T00:00:00.000`), in which case only its date portion is
/// used. The time may be `H:MM`, `HH:MM` or `HH:MM:SS`. Returns `None` when
/// either part is missing or does not parse.
#[must_use]
pub fn parse_crash_timestamp(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = parse_crash_date(date?.trim())?;
    let time = parse_crash_time(time?.trim())?;
    Some(NaiveDateTime::new(date, time))
}

fn parse_crash_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|dt| dt.date())
}

fn parse_crash_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

// ── Output schema ────────────────────────────────────────────────────────

/// Raw dataset field names and the short column names they are renamed to.
pub const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("crash_date", "dtime"),
    ("crash_time", "hour"),
    ("borough", "borough"),
    ("latitude", "lat"),
    ("longitude", "long"),
    ("number_of_persons_injured", "totInj"),
    ("number_of_persons_killed", "totKill"),
    ("number_of_pedestrians_injured", "pedInj"),
    ("number_of_pedestrians_killed", "pedKill"),
    ("number_of_cyclist_injured", "cycInj"),
    ("number_of_cyclist_killed", "cycKill"),
    ("number_of_motorist_injured", "motInj"),
    ("number_of_motorist_killed", "motKill"),
    ("contributing_factor_vehicle_1", "cFactor1"),
    ("contributing_factor_vehicle_2", "cFactor2"),
    ("contributing_factor_vehicle_3", "cFactor3"),
    ("contributing_factor_vehicle_4", "cFactor4"),
    ("contributing_factor_vehicle_5", "cFactor5"),
    ("vehicle_type_code1", "vType1"),
    ("vehicle_type_code2", "vType2"),
    ("vehicle_type_code_3", "vType3"),
    ("vehicle_type_code_4", "vType4"),
    ("vehicle_type_code_5", "vType5"),
];

/// Column order of the processed output table.
pub const PROCESSED_COLUMNS: [&str; 27] = [
    "borough", "lat", "long", "dtime", "totInj", "totKill", "pedInj", "pedKill", "cycInj",
    "cycKill", "motInj", "motKill", "cFactor1", "cFactor2", "cFactor3", "cFactor4", "cFactor5",
    "vType1", "vType2", "vType3", "vType4", "vType5", "severity", "year", "month", "hour",
    "weekday",
];

/// Returns the short column name for a raw dataset field, if it has one.
#[must_use]
pub fn short_name(raw_field: &str) -> Option<&'static str> {
    COLUMN_RENAMES
        .iter()
        .find(|(raw, _)| *raw == raw_field)
        .map(|(_, short)| *short)
}
