//! Retrieval summary printed after a successful fetch.

use std::fmt;

use serde_json::Value;

use crate::table::CollisionTable;

/// Record count, observed date range and distinct boroughs of a fetched
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSummary {
    /// Number of records retrieved.
    pub record_count: usize,
    /// Earliest `crash_date` value seen.
    pub min_date: Option<String>,
    /// Latest `crash_date` value seen.
    pub max_date: Option<String>,
    /// Distinct `borough` values in order of first appearance. `None`
    /// stands for records without a borough.
    pub boroughs: Vec<Option<String>>,
}

impl RetrievalSummary {
    /// Summarizes a table of raw records.
    #[must_use]
    pub fn from_table(table: &CollisionTable) -> Self {
        let dates: Vec<&str> = table
            .column_values("crash_date")
            .filter_map(|v| v.and_then(Value::as_str))
            .collect();

        let mut boroughs: Vec<Option<String>> = Vec::new();
        for value in table.column_values("borough") {
            let borough = value.and_then(Value::as_str).map(String::from);
            if !boroughs.contains(&borough) {
                boroughs.push(borough);
            }
        }

        Self {
            record_count: table.len(),
            min_date: dates.iter().min().map(ToString::to_string),
            max_date: dates.iter().max().map(ToString::to_string),
            boroughs,
        }
    }
}

impl fmt::Display for RetrievalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Retrieved {} records", self.record_count)?;
        writeln!(
            f,
            "Date range: {} to {}",
            self.min_date.as_deref().unwrap_or("n/a"),
            self.max_date.as_deref().unwrap_or("n/a"),
        )?;
        let boroughs: Vec<String> = self
            .boroughs
            .iter()
            .map(|b| b.as_ref().map_or_else(|| "null".to_string(), |b| format!("'{b}'")))
            .collect();
        write!(f, "Boroughs represented: [{}]", boroughs.join(", "))
    }
}
