//! Error types for the sheetsplit engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while splitting or archiving a single file
#[derive(Debug, Error)]
pub enum SplitError {
    /// File extension is neither `csv` nor `xlsx`
    #[error("unsupported file type: {extension:?}")]
    UnsupportedFileType {
        /// Extension as found on the path (empty when missing)
        extension: String,
    },

    /// File is too large for the light path and the heavy path is disabled
    #[error(
        "file size {size_mb:.2} MB exceeds the light-path threshold of {threshold_mb} MB, processing stopped"
    )]
    ThresholdExceeded {
        /// Measured size in MB
        size_mb: f64,
        /// Configured threshold in MB
        threshold_mb: f64,
    },

    /// Chunk size of zero
    #[error("rows per file must be greater than zero")]
    InvalidRowsPerFile,

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Delimited-text read or write error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet read error
    #[error("spreadsheet read error: {0}")]
    SheetRead(#[from] calamine::XlsxError),

    /// Spreadsheet write error
    #[error("spreadsheet write error: {0}")]
    SheetWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Data row with more fields than the header
    #[error("line {line}: expected at most {expected} fields, found {found}")]
    MalformedRow {
        /// 1-based line number in the source file
        line: u64,
        /// Header width
        expected: usize,
        /// Fields on the row
        found: usize,
    },

    /// Workbook has no worksheet to read
    #[error("workbook has no worksheets")]
    NoWorksheet,

    /// Chunks were written but the original could not be moved
    #[error("failed to archive {path:?}: {source}")]
    Archive {
        /// File that could not be moved
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },
}

impl SplitError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Classification, configuration and content errors are terminal;
    /// anything that touched the filesystem or a codec is retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UnsupportedFileType { .. }
            | Self::ThresholdExceeded { .. }
            | Self::InvalidRowsPerFile
            | Self::MalformedRow { .. }
            | Self::NoWorksheet => false,
            Self::Csv(e) => !matches!(
                e.kind(),
                csv::ErrorKind::Utf8 { .. } | csv::ErrorKind::UnequalLengths { .. }
            ),
            _ => true,
        }
    }
}

/// Errors raised by the batch driver before any file is processed
#[derive(Debug, Error)]
pub enum DriverError {
    /// Input directory could not be listed
    #[error("failed to list input directory {path:?}: {source}")]
    ListInput {
        /// Input directory
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },

    /// A worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// Single-file policy found nothing to process
    #[error("no files found in {0:?}")]
    NoFiles(PathBuf),

    /// Single-file policy found more than one file
    #[error("found {count} files in {path:?}, only one file may be processed at a time")]
    TooManyFiles {
        /// Input directory
        path: PathBuf,
        /// Number of files found
        count: usize,
    },
}

/// Result alias for split operations
pub type Result<T> = std::result::Result<T, SplitError>;
