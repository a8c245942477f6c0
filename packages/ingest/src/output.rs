//! Output location and CSV persistence.

use std::path::{Path, PathBuf};

use nyc_collisions_source::parsing::cell_text;

use crate::IngestError;
use crate::table::CollisionTable;

/// File name of the processed collisions table.
pub const OUTPUT_FILENAME: &str = "NYPD_Motor_Vehicle_Collisions_processed.csv";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory if the manifest is not nested two levels deep.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the default output path, `<project root>/`[`OUTPUT_FILENAME`].
#[must_use]
pub fn default_output_path() -> PathBuf {
    project_root().join(OUTPUT_FILENAME)
}

/// Writes `table` to `path` as comma-separated text with a header row.
///
/// Rows are written to a sibling `.tmp` file which then replaces `path`,
/// so an existing file is only overwritten once the new one is complete.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be written or renamed.
pub fn write_csv(table: &CollisionTable, path: &Path) -> Result<(), IngestError> {
    let tmp_path = tmp_path_for(path);

    let result = write_rows(table, &tmp_path)
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(IngestError::from));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result?;

    log::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn write_rows(table: &CollisionTable, path: &Path) -> Result<(), IngestError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer.flush()?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
