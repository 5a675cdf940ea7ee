//! # sheetsplit files
//!
//! Tabular file splitting engine.
//!
//! This crate provides:
//! - CSV and XLSX reading and writing
//! - Row chunking into `part_<n>.<ext>` files
//! - Fixed-delay retry with explicit outcomes
//! - Per-file processing with size threshold and archive move
//! - Batch dispatch over an input directory with a bounded worker pool

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunker;
pub mod driver;
pub mod error;
pub mod format;
pub mod formats;
pub mod pool;
pub mod processor;
pub mod retry;
pub mod splitter;
pub mod table;

pub use chunker::RowChunker;
pub use driver::{BatchDriver, BatchReport, DispatchPolicy};
pub use error::{DriverError, SplitError};
pub use format::FileFormat;
pub use pool::{FileHandler, WorkerPool};
pub use processor::{FileOutcome, FileProcessor, FileState, FileStatus, ProcessorSettings};
pub use retry::{RetryOutcome, RetryPolicy, Retryable};
pub use splitter::{FileSplitter, ReadStrategy, SplitReport};
pub use table::{Cell, Row, Table};

/// Default number of rows per chunk file
pub const DEFAULT_ROWS_PER_FILE: usize = 10_000;
