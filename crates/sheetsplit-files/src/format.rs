//! Input format detection and chunk file naming.

use crate::error::{Result, SplitError};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Prefix shared by every chunk file name
pub const CHUNK_PREFIX: &str = "part_";

/// Supported tabular formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Comma-separated text with a header row
    Csv,
    /// Single-sheet Excel workbook
    Xlsx,
}

impl FileFormat {
    /// Detect the format from a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::UnsupportedFileType`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(SplitError::UnsupportedFileType {
                extension: extension.to_string(),
            }),
        }
    }

    /// File extension written on chunk files
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// Name of the chunk at zero-based `index`, e.g. `part_1.csv` for index 0
    #[must_use]
    pub fn chunk_file_name(self, index: usize) -> String {
        format!("{CHUNK_PREFIX}{}.{}", index + 1, self.extension())
    }

    /// Whether `name` looks like a chunk file of this format
    #[must_use]
    pub fn is_chunk_file_name(self, name: &str) -> bool {
        name.strip_prefix(CHUNK_PREFIX)
            .and_then(|rest| rest.strip_suffix(self.extension()))
            .and_then(|rest| rest.strip_suffix('.'))
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
