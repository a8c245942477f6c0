//! Full-variant transformation: short column names, merged timestamp,
//! calendar fields and severity.

use std::collections::BTreeMap;

use nyc_collisions_collision_models::{
    COLUMN_RENAMES, CalendarFields, PROCESSED_COLUMNS, Severity, TIMESTAMP_FORMAT,
    parse_crash_timestamp, short_name,
};
use nyc_collisions_source::parsing::{Count, parse_count};
use serde_json::Value;

use crate::IngestError;
use crate::table::CollisionTable;

/// A row keyed by short column name.
type ShortRow<'a> = BTreeMap<&'static str, &'a Value>;

/// Renames, derives and selects the processed columns of `table`.
///
/// Every input row yields one output row; rows whose date and time cannot
/// be parsed keep empty `dtime`, `year`, `month`, `hour` and `weekday`
/// cells.
///
/// # Errors
///
/// Returns [`IngestError::InvalidCount`] if a killed or injured total is
/// present but not a whole number.
pub fn process(table: &CollisionTable) -> Result<CollisionTable, IngestError> {
    let renamed: Vec<(usize, &'static str)> = table
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| short_name(raw).map(|short| (idx, short)))
        .collect();

    let missing: Vec<&str> = COLUMN_RENAMES
        .iter()
        .filter(|(raw, _)| table.column_index(raw).is_none())
        .map(|(raw, _)| *raw)
        .collect();
    if !missing.is_empty() {
        log::debug!("Fields absent from every record: {}", missing.join(", "));
    }

    let mut output = CollisionTable::with_columns(PROCESSED_COLUMNS);
    let mut unparsed = 0usize;

    for row in table.rows() {
        let short: ShortRow<'_> = renamed.iter().map(|(idx, name)| (*name, &row[*idx])).collect();
        let processed = process_row(&short)?;
        if processed.timestamp_missing {
            unparsed += 1;
        }
        output.push_row(processed.cells);
    }

    if unparsed > 0 {
        log::warn!("{unparsed} record(s) had an unparsable crash date/time");
    }

    Ok(output)
}

struct ProcessedRow {
    cells: Vec<Value>,
    timestamp_missing: bool,
}

fn process_row(row: &ShortRow<'_>) -> Result<ProcessedRow, IngestError> {
    let timestamp = parse_crash_timestamp(text(row, "dtime"), text(row, "hour"));
    let calendar = timestamp.as_ref().map(CalendarFields::from_timestamp);
    let severity = Severity::from_counts(count(row, "totKill")?, count(row, "totInj")?);

    let cells = PROCESSED_COLUMNS
        .iter()
        .map(|column| match *column {
            "dtime" => timestamp.map_or(Value::Null, |ts| {
                Value::String(ts.format(TIMESTAMP_FORMAT).to_string())
            }),
            "severity" => Value::String(severity.to_string()),
            "year" => calendar.map_or(Value::Null, |c| Value::from(c.year)),
            "month" => calendar.map_or(Value::Null, |c| Value::from(c.month)),
            "hour" => calendar.map_or(Value::Null, |c| Value::from(c.hour)),
            "weekday" => calendar.map_or(Value::Null, |c| Value::from(c.weekday)),
            other => row.get(other).map_or(Value::Null, |v| (*v).clone()),
        })
        .collect();

    Ok(ProcessedRow {
        cells,
        timestamp_missing: timestamp.is_none(),
    })
}

fn text<'a>(row: &ShortRow<'a>, column: &str) -> Option<&'a str> {
    row.get(column).and_then(|v| v.as_str())
}

/// Reads a casualty total. A missing value counts as zero.
fn count(row: &ShortRow<'_>, column: &'static str) -> Result<i64, IngestError> {
    let value = row.get(column).copied();
    match parse_count(value) {
        Count::Value(n) => Ok(n),
        Count::Missing => Ok(0),
        Count::Invalid => Err(IngestError::InvalidCount {
            column,
            value: value.map(ToString::to_string).unwrap_or_default(),
        }),
    }
}
