//! Delimited-text reading and writing.
//!
//! Files are comma-separated with a header row. Readers never hold more
//! than one chunk of rows; the rolling writer holds a single record.
//! Rows shorter than the header are padded with empty fields; longer rows
//! are rejected.

use crate::error::{Result, SplitError};
use crate::format::FileFormat;
use crate::table::{Cell, Row};
use csv::{Reader, ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::path::{Path, PathBuf};

fn open_reader(path: &Path) -> Result<Reader<File>> {
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?)
}

/// Pad `record` to `width` fields
fn conform(record: &mut StringRecord, width: usize) -> Result<()> {
    if record.len() > width {
        return Err(SplitError::MalformedRow {
            line: record.position().map_or(0, |pos| pos.line()),
            expected: width,
            found: record.len(),
        });
    }
    while record.len() < width {
        record.push_field("");
    }
    Ok(())
}

fn record_to_row(record: &StringRecord) -> Row {
    record.iter().map(Cell::from).collect()
}

/// Reads a CSV file one chunk of rows at a time
pub struct CsvChunkReader {
    reader: Reader<File>,
    header: Vec<String>,
    rows_per_chunk: usize,
    record: StringRecord,
}

impl CsvChunkReader {
    /// Open `path` and read its header row
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the header is malformed.
    pub fn open(path: &Path, rows_per_chunk: usize) -> Result<Self> {
        let mut reader = open_reader(path)?;
        let header = reader.headers()?.iter().map(str::to_string).collect();

        Ok(Self {
            reader,
            header,
            rows_per_chunk,
            record: StringRecord::new(),
        })
    }

    /// Column names
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Read the next chunk, or `None` once the file is exhausted
    ///
    /// # Errors
    ///
    /// Returns an error on malformed records or read failures.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<Row>>> {
        let mut rows = Vec::with_capacity(self.rows_per_chunk.min(4096));

        while rows.len() < self.rows_per_chunk {
            if !self.reader.read_record(&mut self.record)? {
                break;
            }
            conform(&mut self.record, self.header.len())?;
            rows.push(record_to_row(&self.record));
        }

        Ok(if rows.is_empty() { None } else { Some(rows) })
    }
}

/// Write a header and rows to a new CSV file at `path`
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_rows(path: &Path, header: &[String], rows: &[Row]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

/// Streams records straight from a CSV file into consecutive chunk files.
///
/// A new `part_<n>.csv` is opened every `rows_per_chunk` records.
pub struct RollingCsvWriter {
    output_dir: PathBuf,
    header: StringRecord,
    rows_per_chunk: usize,
    current: Option<Writer<File>>,
    rows_in_current: usize,
    chunks: usize,
    rows: usize,
}

impl RollingCsvWriter {
    /// Create a writer emitting chunks into `output_dir`
    #[must_use]
    pub fn new(output_dir: &Path, header: StringRecord, rows_per_chunk: usize) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            header,
            rows_per_chunk,
            current: None,
            rows_in_current: 0,
            chunks: 0,
            rows: 0,
        }
    }

    /// Append one record, rolling over to a new chunk file when full
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk file cannot be created or written.
    pub fn write(&mut self, record: &StringRecord) -> Result<()> {
        if self.rows_in_current == self.rows_per_chunk {
            self.close_current()?;
        }

        if self.current.is_none() {
            let path = self
                .output_dir
                .join(FileFormat::Csv.chunk_file_name(self.chunks));
            let mut writer = Writer::from_path(path)?;
            writer.write_record(&self.header)?;
            self.current = Some(writer);
            self.chunks += 1;
        }

        if let Some(writer) = self.current.as_mut() {
            writer.write_record(record)?;
        }
        self.rows_in_current += 1;
        self.rows += 1;
        Ok(())
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some(mut writer) = self.current.take() {
            writer.flush()?;
        }
        self.rows_in_current = 0;
        Ok(())
    }

    /// Flush the last chunk and return `(rows, chunks)` written
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn finish(mut self) -> Result<(usize, usize)> {
        self.close_current()?;
        Ok((self.rows, self.chunks))
    }
}

/// Stream every record of `path` into chunk files under `output_dir`.
///
/// Returns `(rows, chunks)` written.
///
/// # Errors
///
/// Returns an error on read, parse or write failures.
pub fn stream_split(path: &Path, output_dir: &Path, rows_per_chunk: usize) -> Result<(usize, usize)> {
    let mut reader = open_reader(path)?;
    let header = reader.headers()?.clone();
    let width = header.len();
    let mut writer = RollingCsvWriter::new(output_dir, header, rows_per_chunk);

    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        conform(&mut record, width)?;
        writer.write(&record)?;
    }

    writer.finish()
}
