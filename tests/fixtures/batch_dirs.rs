//! Temporary input/output/archive directory layout.
//!
//! # Example
//!
//! ```no_run
//! use sheetsplit_integration_tests::fixtures::BatchDirs;
//!
//! let dirs = BatchDirs::new();
//! let source = dirs.write_csv("orders.csv", 25);
//! let processor = dirs.processor(10);
//! assert!(processor.process(&source).is_archived());
//! ```

use sheetsplit_files::{FileProcessor, ProcessorSettings, RetryPolicy};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Input, output and archive directories under one temporary root
pub struct BatchDirs {
    root: TempDir,
    /// Directory scanned for input files
    pub input: PathBuf,
    /// Root for chunk files
    pub output: PathBuf,
    /// Destination of processed originals
    pub archive: PathBuf,
}

impl BatchDirs {
    /// Create the layout; only `input` exists on disk
    pub fn new() -> Self {
        let root = TempDir::new().expect("failed to create temp dir");
        let input = root.path().join("input");
        fs::create_dir(&input).expect("failed to create input dir");

        Self {
            input,
            output: root.path().join("output"),
            archive: root.path().join("archive"),
            root,
        }
    }

    /// Temporary root
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write `rows` data rows of `id,name,amount` to `input/<name>`
    pub fn write_csv(&self, name: &str, rows: usize) -> PathBuf {
        let path = self.input.join(name);
        fs::write(&path, csv_contents(rows)).expect("failed to write csv");
        path
    }

    /// Write exactly `bytes` bytes (at least a header) of CSV to `input/<name>`.
    ///
    /// The last row may be cut short; only use it for size checks.
    pub fn write_csv_of_size(&self, name: &str, bytes: usize) -> PathBuf {
        let path = self.input.join(name);
        let mut contents = String::from("id,payload\n");
        let mut i = 0;
        while contents.len() < bytes {
            contents.push_str(&format!("{i},{}\n", "x".repeat(20)));
            i += 1;
        }
        contents.truncate(bytes.max(11));
        fs::write(&path, contents).expect("failed to write csv");
        path
    }

    /// Default processor settings for this layout
    pub fn settings(&self, rows_per_file: usize) -> ProcessorSettings {
        ProcessorSettings {
            output_directory: self.output.clone(),
            archive_directory: self.archive.clone(),
            light_threshold_mb: 10.0,
            rows_per_file,
            heavy_path_enabled: false,
            retry: RetryPolicy::new(3, Duration::ZERO),
        }
    }

    /// Processor with default settings
    pub fn processor(&self, rows_per_file: usize) -> FileProcessor {
        FileProcessor::new(self.settings(rows_per_file)).expect("invalid settings")
    }

    /// Names of the files currently in `input`, sorted
    pub fn input_names(&self) -> Vec<String> {
        sorted_names(&self.input)
    }

    /// Names of the files in `dir`, sorted (empty if it does not exist)
    pub fn names_in(&self, dir: &Path) -> Vec<String> {
        sorted_names(dir)
    }
}

impl Default for BatchDirs {
    fn default() -> Self {
        Self::new()
    }
}

/// CSV text with a header and `rows` data rows
pub fn csv_contents(rows: usize) -> String {
    let mut contents = String::from("id,name,amount\n");
    for i in 0..rows {
        contents.push_str(&format!("{i},name-{i},{}\n", i * 7));
    }
    contents
}

/// Data rows of a CSV file as raw lines, header dropped
pub fn read_csv_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("failed to read chunk")
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| {
            e.expect("bad dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
