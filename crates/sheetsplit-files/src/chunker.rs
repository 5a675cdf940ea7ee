//! Row chunking.

use crate::DEFAULT_ROWS_PER_FILE;
use crate::error::{Result, SplitError};
use crate::format::FileFormat;
use crate::formats;
use crate::table::{Row, Table};
use std::path::{Path, PathBuf};
use std::slice::Chunks;
use tracing::debug;

/// Split rows into fixed-size chunk files
#[derive(Debug, Clone, Copy)]
pub struct RowChunker {
    rows_per_file: usize,
}

impl RowChunker {
    /// Create a new chunker with default chunk size
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows_per_file: DEFAULT_ROWS_PER_FILE,
        }
    }

    /// Create a new chunker with custom chunk size
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::InvalidRowsPerFile`] when `rows_per_file` is zero.
    pub fn with_rows_per_file(rows_per_file: usize) -> Result<Self> {
        if rows_per_file == 0 {
            return Err(SplitError::InvalidRowsPerFile);
        }
        Ok(Self { rows_per_file })
    }

    /// Get chunk size
    #[must_use]
    pub fn rows_per_file(&self) -> usize {
        self.rows_per_file
    }

    /// Calculate number of chunks for a row count
    #[must_use]
    pub fn chunk_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.rows_per_file)
    }

    /// Consecutive row groups, in order, the last possibly short
    pub fn groups<'a>(&self, rows: &'a [Row]) -> Chunks<'a, Row> {
        rows.chunks(self.rows_per_file)
    }

    /// Write every group of `table` to `output_dir` as `part_<n>.<ext>`.
    ///
    /// Returns the paths written, in chunk order. An empty table writes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if any chunk file cannot be written.
    pub fn write_chunks(
        &self,
        table: &Table,
        format: FileFormat,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.chunk_count(table.row_count()));

        for (index, group) in self.groups(&table.rows).enumerate() {
            written.push(self.write_chunk_at(index, &table.header, group, format, output_dir)?);
        }

        Ok(written)
    }

    /// Write one pre-grouped chunk at zero-based `index`
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk file cannot be written.
    pub fn write_chunk_at(
        &self,
        index: usize,
        header: &[String],
        rows: &[Row],
        format: FileFormat,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let path = output_dir.join(format.chunk_file_name(index));
        formats::write_chunk(format, &path, header, rows)?;
        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}

impl Default for RowChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use std::fs;
    use tempfile::TempDir;

    fn table(rows: usize) -> Table {
        Table::new(
            vec!["n".to_string()],
            (0..rows).map(|i| vec![Cell::Int(i as i64)]).collect(),
        )
    }

    #[test]
    fn test_chunk_count() {
        let chunker = RowChunker::with_rows_per_file(10).unwrap();
        assert_eq!(chunker.chunk_count(0), 0);
        assert_eq!(chunker.chunk_count(1), 1);
        assert_eq!(chunker.chunk_count(10), 1);
        assert_eq!(chunker.chunk_count(11), 2);
        assert_eq!(chunker.chunk_count(100), 10);
    }

    #[test]
    fn test_zero_rows_per_file_rejected() {
        assert!(matches!(
            RowChunker::with_rows_per_file(0),
            Err(SplitError::InvalidRowsPerFile)
        ));
    }

    #[test]
    fn test_default_chunker() {
        assert_eq!(RowChunker::default().rows_per_file(), DEFAULT_ROWS_PER_FILE);
    }

    #[test]
    fn test_groups_preserve_order() {
        let chunker = RowChunker::with_rows_per_file(3).unwrap();
        let t = table(7);
        let groups: Vec<&[Row]> = chunker.groups(&t.rows).collect();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2], &[vec![Cell::Int(6)]][..]);
        let flattened: Vec<Row> = groups.concat();
        assert_eq!(flattened, t.rows);
    }

    #[test]
    fn test_write_chunks_csv() {
        let dir = TempDir::new().unwrap();
        let chunker = RowChunker::with_rows_per_file(2).unwrap();

        let written = chunker
            .write_chunks(&table(5), FileFormat::Csv, dir.path())
            .unwrap();

        assert_eq!(written.len(), 3);
        assert!(written[0].ends_with("part_1.csv"));
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "n\n0\n1\n");
        assert_eq!(fs::read_to_string(&written[2]).unwrap(), "n\n4\n");
    }

    #[test]
    fn test_write_chunks_empty_table() {
        let dir = TempDir::new().unwrap();
        let chunker = RowChunker::with_rows_per_file(2).unwrap();

        let written = chunker
            .write_chunks(&table(0), FileFormat::Csv, dir.path())
            .unwrap();
        assert!(written.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_chunks_unwritable_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let chunker = RowChunker::with_rows_per_file(2).unwrap();

        let err = chunker
            .write_chunks(&table(3), FileFormat::Csv, &missing)
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
