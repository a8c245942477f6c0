//! In-memory collision table.
//!
//! Rows are stored as JSON values aligned to an ordered column list so the
//! same structure holds both the raw dataset fields and the processed
//! short-name schema.

use std::collections::HashSet;

use nyc_collisions_source::RawRecord;
use nyc_collisions_source::parsing::{LOCATION_FIELD, flatten_nested};
use serde_json::Value;

/// An ordered set of columns and the rows beneath them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl CollisionTable {
    /// Creates a table with the given columns and no rows.
    #[must_use]
    pub fn with_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Loads raw records into a table.
    ///
    /// Columns are the union of all record fields in the order they are
    /// first seen. Fields a record lacks become `null`. A nested
    /// [`LOCATION_FIELD`] value is replaced with its JSON text.
    #[must_use]
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Self {
            columns,
            rows: Vec::with_capacity(records.len()),
        };

        for mut record in records {
            if let Some(location) = record.get_mut(LOCATION_FIELD) {
                *location = flatten_nested(location.take());
            }
            let row = table
                .columns
                .iter()
                .map(|column| record.remove(column).unwrap_or(Value::Null))
                .collect();
            table.rows.push(row);
        }

        table
    }

    /// Appends a row. Missing trailing cells are padded with `null`.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of `column`, if present.
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Iterates over the values of `column`, yielding `None` for every row
    /// when the column does not exist.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> impl Iterator<Item = Option<&'a Value>> + use<'a> {
        let idx = self.column_index(column);
        self.rows.iter().map(move |row| idx.map(|i| &row[i]))
    }
}
