//! Format-specific readers and writers.

pub mod csv;
pub mod xlsx;

use crate::error::Result;
use crate::format::FileFormat;
use crate::table::Row;
use std::path::Path;

/// Write one chunk file in the given format
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_chunk(format: FileFormat, path: &Path, header: &[String], rows: &[Row]) -> Result<()> {
    match format {
        FileFormat::Csv => self::csv::write_rows(path, header, rows),
        FileFormat::Xlsx => xlsx::write_rows(path, header, rows),
    }
}
