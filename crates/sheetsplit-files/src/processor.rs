//! Single-file lifecycle.
//!
//! `Measured -> ThresholdCheck -> {Processing | Rejected} -> {Archived | Failed}`
//!
//! The processor is the boundary where errors become outcomes: nothing
//! below it can abort a batch.

use crate::error::{Result, SplitError};
use crate::retry::RetryPolicy;
use crate::splitter::{FileSplitter, ReadStrategy, SplitReport};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Bytes per megabyte used for the size threshold
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Settings for processing one file
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Root directory for chunk files
    pub output_directory: PathBuf,
    /// Directory receiving processed originals
    pub archive_directory: PathBuf,
    /// Files below this size (MB) take the light path
    pub light_threshold_mb: f64,
    /// Maximum rows per chunk file
    pub rows_per_file: usize,
    /// Split files at or above the threshold instead of rejecting them
    pub heavy_path_enabled: bool,
    /// Retry policy around the split
    pub retry: RetryPolicy,
}

/// Lifecycle state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Size measured
    Measured,
    /// Being split
    Processing,
    /// Refused by the size threshold
    Rejected,
    /// Split and moved to the archive
    Archived,
    /// Split or archive failed; original left in place
    Failed,
}

/// Final status of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Chunks written and original archived
    Archived {
        /// Split summary
        report: SplitReport,
        /// Split attempts made
        attempts: u32,
        /// New location of the original
        archived_to: PathBuf,
    },
    /// Refused by the size threshold; original left in place
    Rejected {
        /// Rejection message
        reason: String,
    },
    /// Split or archive failed; original left in place
    Failed {
        /// Error message
        error: String,
        /// Split attempts made
        attempts: u32,
    },
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    /// Input path as discovered
    pub path: PathBuf,
    /// Size in bytes when measured (0 if it could not be measured)
    pub size_bytes: u64,
    /// Final status
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    /// Terminal lifecycle state
    #[must_use]
    pub fn state(&self) -> FileState {
        match self.status {
            FileStatus::Archived { .. } => FileState::Archived,
            FileStatus::Rejected { .. } => FileState::Rejected,
            FileStatus::Failed { .. } => FileState::Failed,
        }
    }

    /// Whether the file was split and archived
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.state() == FileState::Archived
    }
}

/// Processes files one at a time: threshold check, retried split, archive
#[derive(Debug, Clone)]
pub struct FileProcessor {
    settings: ProcessorSettings,
    splitter: FileSplitter,
}

impl FileProcessor {
    /// Create a processor
    ///
    /// # Errors
    ///
    /// Returns an error when `rows_per_file` is zero.
    pub fn new(settings: ProcessorSettings) -> Result<Self> {
        let splitter = FileSplitter::new(&settings.output_directory, settings.rows_per_file)?;
        Ok(Self { settings, splitter })
    }

    /// Processor settings
    #[must_use]
    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// Choose the read strategy for a file of `size_mb`
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::ThresholdExceeded`] at or above the threshold
    /// while the heavy path is disabled.
    pub fn select_strategy(&self, size_mb: f64) -> Result<ReadStrategy> {
        if size_mb < self.settings.light_threshold_mb {
            Ok(ReadStrategy::Light)
        } else if self.settings.heavy_path_enabled {
            Ok(ReadStrategy::Heavy)
        } else {
            Err(SplitError::ThresholdExceeded {
                size_mb,
                threshold_mb: self.settings.light_threshold_mb,
            })
        }
    }

    /// Run one file through its whole lifecycle. Never panics on I/O errors;
    /// every failure is logged and reported in the outcome.
    pub fn process(&self, path: &Path) -> FileOutcome {
        let size_bytes = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                return outcome(
                    path,
                    0,
                    FileStatus::Failed {
                        error: SplitError::Io(e).to_string(),
                        attempts: 0,
                    },
                );
            }
        };
        let size_mb = size_bytes as f64 / BYTES_PER_MB;
        debug!(
            "{} measured at {:.2} MB ({:?})",
            path.display(),
            size_mb,
            FileState::Measured
        );

        let strategy = match self.select_strategy(size_mb) {
            Ok(strategy) => strategy,
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                return outcome(
                    path,
                    size_bytes,
                    FileStatus::Rejected {
                        reason: e.to_string(),
                    },
                );
            }
        };

        debug!("{} {:?} via {:?} path", path.display(), FileState::Processing, strategy);
        let split = self.settings.retry.run(|attempt| {
            debug!("Splitting {} (attempt {})", path.display(), attempt);
            self.splitter.split(path, strategy)
        });

        let status = match split.into_result() {
            Ok((report, attempts)) => match self.archive(path) {
                Ok(archived_to) => {
                    info!(
                        "Archived {} to {}",
                        path.display(),
                        archived_to.display()
                    );
                    FileStatus::Archived {
                        report,
                        attempts,
                        archived_to,
                    }
                }
                Err(e) => {
                    error!("Error processing {}: {}", path.display(), e);
                    FileStatus::Failed {
                        error: e.to_string(),
                        attempts,
                    }
                }
            },
            Err((e, attempts)) => {
                error!("Error processing {}: {}", path.display(), e);
                FileStatus::Failed {
                    error: e.to_string(),
                    attempts,
                }
            }
        };

        outcome(path, size_bytes, status)
    }

    /// Move `source` into the archive directory.
    ///
    /// Falls back to copy-then-delete when a rename is refused, e.g. across
    /// filesystems. An archived file of the same name is never replaced;
    /// the original then stays where it is.
    fn archive(&self, source: &Path) -> Result<PathBuf> {
        let archive_err = |e: io::Error| SplitError::Archive {
            path: source.to_path_buf(),
            source: e,
        };

        fs::create_dir_all(&self.settings.archive_directory).map_err(archive_err)?;
        let name = source.file_name().unwrap_or(source.as_os_str());
        let target = self.settings.archive_directory.join(name);
        if target.exists() {
            return Err(archive_err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            )));
        }

        if let Err(rename_err) = fs::rename(source, &target) {
            debug!("Rename failed ({}), copying {}", rename_err, source.display());
            fs::copy(source, &target).map_err(|_| archive_err(rename_err))?;
            fs::remove_file(source).map_err(archive_err)?;
        }

        Ok(target)
    }
}

fn outcome(path: &Path, size_bytes: u64, status: FileStatus) -> FileOutcome {
    FileOutcome {
        path: path.to_path_buf(),
        size_bytes,
        status,
    }
}
