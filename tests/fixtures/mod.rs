//! Reusable test fixtures.

mod batch_dirs;

pub use batch_dirs::{BatchDirs, csv_contents, read_csv_rows};
