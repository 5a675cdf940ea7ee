//! Bounded worker pool for whole-file processing.
//!
//! Each worker takes a path from a shared queue and runs the complete file
//! lifecycle on it. Outcomes flow back over a second channel and
//! [`WorkerPool::wait`] blocks until every submitted file has reported.

use crate::processor::{FileOutcome, FileProcessor, FileStatus};
use crossbeam_channel::{Receiver, SendError, Sender, bounded, unbounded};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Work run by a pool thread for each submitted file
pub trait FileHandler: Send + Sync + 'static {
    /// Take `path` to a terminal outcome
    fn handle(&self, path: &Path) -> FileOutcome;
}

impl FileHandler for FileProcessor {
    fn handle(&self, path: &Path) -> FileOutcome {
        self.process(path)
    }
}

/// Pool of file-processing threads
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    task_tx: Sender<PathBuf>,
    result_rx: Receiver<FileOutcome>,
    submitted: Vec<PathBuf>,
}

impl WorkerPool {
    /// Spawn `num_workers` threads (0 = one per CPU)
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned.
    pub fn new<H: FileHandler>(num_workers: usize, handler: Arc<H>) -> io::Result<Self> {
        let num_workers = if num_workers == 0 {
            num_cpus::get()
        } else {
            num_workers
        };

        info!("Creating worker pool with {} workers", num_workers);

        let (task_tx, task_rx) = bounded::<PathBuf>(num_workers * 2);
        let (result_tx, result_rx) = unbounded();

        let mut workers = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let handler = Arc::clone(&handler);

            let handle = thread::Builder::new()
                .name(format!("sheetsplit-worker-{id}"))
                .spawn(move || {
                    debug!("Worker {} starting", id);
                    let mut processed = 0u64;

                    for path in task_rx.iter() {
                        let outcome = handler.handle(&path);
                        processed += 1;
                        if result_tx.send(outcome).is_err() {
                            break;
                        }
                    }

                    debug!("Worker {} shutting down (processed {} files)", id, processed);
                })?;
            workers.push(handle);
        }

        Ok(Self {
            workers,
            task_tx,
            result_rx,
            submitted: Vec::new(),
        })
    }

    /// Number of worker threads
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue a file, blocking while the queue is full
    ///
    /// # Errors
    ///
    /// Returns an error if every worker has exited.
    pub fn submit(&mut self, path: PathBuf) -> Result<(), SendError<PathBuf>> {
        self.task_tx.send(path.clone())?;
        self.submitted.push(path);
        Ok(())
    }

    /// Close the queue and collect one outcome per submitted file.
    ///
    /// `on_outcome` is called on the calling thread as results arrive. A
    /// file whose worker panicked is reported as failed; this needs
    /// unwinding panics.
    pub fn wait(self, mut on_outcome: impl FnMut(&FileOutcome)) -> Vec<FileOutcome> {
        let Self {
            workers,
            task_tx,
            result_rx,
            submitted,
        } = self;
        drop(task_tx);

        let mut outcomes = Vec::with_capacity(submitted.len());
        for outcome in result_rx.iter() {
            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        for handle in workers {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("{} panicked", name);
            }
        }

        let reported: HashSet<PathBuf> = outcomes.iter().map(|o| o.path.clone()).collect();
        for path in submitted {
            if !reported.contains(&path) {
                error!("Error processing {}: worker panicked", path.display());
                let outcome = FileOutcome {
                    path,
                    size_bytes: 0,
                    status: FileStatus::Failed {
                        error: "worker panicked".to_string(),
                        attempts: 0,
                    },
                };
                on_outcome(&outcome);
                outcomes.push(outcome);
            }
        }

        outcomes
    }
}
