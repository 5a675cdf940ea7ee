//! Batch dispatch over the input directory.

use crate::error::DriverError;
use crate::pool::WorkerPool;
use crate::processor::{FileOutcome, FileProcessor, FileState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// How files found in the input directory are dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// One file inline, several across a bounded worker pool
    #[default]
    Concurrent,
    /// Exactly one file inline; zero or several is an error
    SingleOnly,
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concurrent => f.write_str("concurrent"),
            Self::SingleOnly => f.write_str("single_only"),
        }
    }
}

/// Per-file outcomes of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Policy used
    pub policy: DispatchPolicy,
    /// One outcome per file, sorted by path
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    fn count(&self, state: FileState) -> usize {
        self.outcomes.iter().filter(|o| o.state() == state).count()
    }

    /// Files split and archived
    #[must_use]
    pub fn archived(&self) -> usize {
        self.count(FileState::Archived)
    }

    /// Files refused by the size threshold
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.count(FileState::Rejected)
    }

    /// Files whose split or archive failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(FileState::Failed)
    }

    /// Whether every file was archived (true for an empty batch)
    #[must_use]
    pub fn all_archived(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_archived)
    }

    /// Total bytes of the files processed
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.outcomes.iter().map(|o| o.size_bytes).sum()
    }
}

/// Lists the input directory and dispatches each file to the processor
pub struct BatchDriver {
    input_directory: PathBuf,
    policy: DispatchPolicy,
    max_concurrent_files: usize,
    processor: Arc<FileProcessor>,
}

impl BatchDriver {
    /// Create a driver
    #[must_use]
    pub fn new(
        input_directory: impl Into<PathBuf>,
        policy: DispatchPolicy,
        max_concurrent_files: usize,
        processor: FileProcessor,
    ) -> Self {
        Self {
            input_directory: input_directory.into(),
            policy,
            max_concurrent_files,
            processor: Arc::new(processor),
        }
    }

    /// Directory being processed
    #[must_use]
    pub fn input_directory(&self) -> &Path {
        &self.input_directory
    }

    /// Regular files in the input directory, sorted by name
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list_input(&self) -> Result<Vec<PathBuf>, DriverError> {
        let list_err = |source| DriverError::ListInput {
            path: self.input_directory.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.input_directory).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if entry.file_type().map_err(list_err)?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process the input directory and wait for every file
    ///
    /// # Errors
    ///
    /// See [`BatchDriver::run_with`].
    pub fn run(&self) -> Result<BatchReport, DriverError> {
        self.run_with(|_| {}, |_| {})
    }

    /// Process the input directory, reporting progress.
    ///
    /// `on_start` receives the number of files about to be processed and
    /// `on_outcome` each file's outcome as it completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input directory cannot be listed, if the
    /// single-file policy finds zero or several files, or if the worker
    /// pool cannot be started. Per-file failures are reported in the
    /// [`BatchReport`], never as an error.
    pub fn run_with(
        &self,
        on_start: impl FnOnce(usize),
        mut on_outcome: impl FnMut(&FileOutcome),
    ) -> Result<BatchReport, DriverError> {
        let files = self.list_input()?;
        info!(
            "Found {} files in {} ({} policy)",
            files.len(),
            self.input_directory.display(),
            self.policy
        );

        if self.policy == DispatchPolicy::SingleOnly {
            match files.len() {
                0 => {
                    let err = DriverError::NoFiles(self.input_directory.clone());
                    error!("{}", err);
                    return Err(err);
                }
                1 => {}
                count => {
                    let err = DriverError::TooManyFiles {
                        path: self.input_directory.clone(),
                        count,
                    };
                    error!("{}", err);
                    return Err(err);
                }
            }
        }

        on_start(files.len());

        // A lone file is processed on the calling thread.
        let mut outcomes = if files.len() > 1 {
            self.dispatch_pool(files, &mut on_outcome)?
        } else {
            files
                .iter()
                .map(|path| {
                    let outcome = self.processor.process(path);
                    on_outcome(&outcome);
                    outcome
                })
                .collect()
        };
        outcomes.sort_by(|a, b| a.path.cmp(&b.path));

        let report = BatchReport {
            policy: self.policy,
            outcomes,
        };
        info!(
            "Batch complete: {} archived, {} rejected, {} failed",
            report.archived(),
            report.rejected(),
            report.failed()
        );
        Ok(report)
    }

    fn dispatch_pool(
        &self,
        files: Vec<PathBuf>,
        on_outcome: &mut impl FnMut(&FileOutcome),
    ) -> Result<Vec<FileOutcome>, DriverError> {
        let limit = match self.max_concurrent_files {
            0 => num_cpus::get(),
            n => n,
        };
        let workers = limit.min(files.len());
        let mut pool = WorkerPool::new(workers, Arc::clone(&self.processor))
            .map_err(DriverError::WorkerSpawn)?;

        for path in files {
            if let Err(e) = pool.submit(path) {
                error!("Error processing {}: worker pool closed", e.0.display());
                break;
            }
        }

        Ok(pool.wait(on_outcome))
    }
}
