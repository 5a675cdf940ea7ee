//! File splitting.
//!
//! Reads one tabular file and writes its rows as numbered chunk files.
//! Chunks of `<input>/<stem>.<ext>` land in `<output>/<stem>/part_<n>.<ext>`.

use crate::chunker::RowChunker;
use crate::error::Result;
use crate::format::FileFormat;
use crate::formats::{csv, xlsx};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a file is read into memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    /// Below the size threshold: spreadsheet loaded whole, CSV read one chunk at a time
    Light,
    /// At or above the threshold: CSV streamed row by row into rolling chunk files
    Heavy,
}

/// Result of splitting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    /// Detected format
    pub format: FileFormat,
    /// Strategy used
    pub strategy: ReadStrategy,
    /// Data rows read (header excluded)
    pub rows: usize,
    /// Chunk files written
    pub chunks: usize,
    /// Directory holding the chunk files
    pub output_dir: PathBuf,
}

/// Splits tabular files into chunk files under an output root
#[derive(Debug, Clone)]
pub struct FileSplitter {
    output_root: PathBuf,
    chunker: RowChunker,
}

impl FileSplitter {
    /// Create a splitter writing under `output_root`
    ///
    /// # Errors
    ///
    /// Returns an error when `rows_per_file` is zero.
    pub fn new(output_root: impl Into<PathBuf>, rows_per_file: usize) -> Result<Self> {
        Ok(Self {
            output_root: output_root.into(),
            chunker: RowChunker::with_rows_per_file(rows_per_file)?,
        })
    }

    /// Rows written per chunk file
    #[must_use]
    pub fn rows_per_file(&self) -> usize {
        self.chunker.rows_per_file()
    }

    /// Directory receiving the chunks of `source`
    #[must_use]
    pub fn output_dir_for(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        self.output_root.join(stem)
    }

    /// Split `source` into chunk files.
    ///
    /// Stale chunk files from an earlier attempt are removed first, so the
    /// output directory only ever holds the chunks of the latest run.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SplitError::UnsupportedFileType`] for unknown
    /// extensions, or any read/write error from the format codecs.
    pub fn split(&self, source: &Path, strategy: ReadStrategy) -> Result<SplitReport> {
        let format = FileFormat::from_path(source)?;
        let output_dir = self.output_dir_for(source);
        prepare_output_dir(&output_dir, format)?;

        let (rows, chunks) = match (format, strategy) {
            (FileFormat::Csv, ReadStrategy::Light) => self.split_csv_buffered(source, &output_dir)?,
            (FileFormat::Csv, ReadStrategy::Heavy) => {
                csv::stream_split(source, &output_dir, self.rows_per_file())?
            }
            // The sheet reader has no streaming mode; both tiers load it whole.
            (FileFormat::Xlsx, _) => {
                let table = xlsx::read_table(source)?;
                let written = self.chunker.write_chunks(&table, format, &output_dir)?;
                (table.row_count(), written.len())
            }
        };

        info!(
            "Processed {} ({:?} path) into {} files ({} rows)",
            source.display(),
            strategy,
            chunks,
            rows
        );

        Ok(SplitReport {
            format,
            strategy,
            rows,
            chunks,
            output_dir,
        })
    }

    fn split_csv_buffered(&self, source: &Path, output_dir: &Path) -> Result<(usize, usize)> {
        let mut reader = csv::CsvChunkReader::open(source, self.rows_per_file())?;
        let header = reader.header().to_vec();
        let (mut rows, mut chunks) = (0, 0);

        while let Some(group) = reader.next_chunk()? {
            self.chunker
                .write_chunk_at(chunks, &header, &group, FileFormat::Csv, output_dir)?;
            rows += group.len();
            chunks += 1;
        }

        Ok((rows, chunks))
    }
}

/// Create `dir` if needed and delete chunk files of `format` left in it
fn prepare_output_dir(dir: &Path, format: FileFormat) -> Result<()> {
    fs::create_dir_all(dir)?;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name
            .to_str()
            .is_some_and(|name| format.is_chunk_file_name(name))
            && entry.file_type()?.is_file()
        {
            fs::remove_file(entry.path())?;
            debug!("Removed stale chunk {}", entry.path().display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitError;
    use crate::table::{Cell, Table};
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, rows: usize) -> PathBuf {
        let path = dir.join(name);
        let mut contents = String::from("id,value\n");
        for i in 0..rows {
            contents.push_str(&format!("{i},v{i}\n"));
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn chunk_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_output_dir_for() {
        let splitter = FileSplitter::new("/out", 10).unwrap();
        assert_eq!(
            splitter.output_dir_for(Path::new("/in/sales.csv")),
            PathBuf::from("/out/sales")
        );
    }

    #[test]
    fn test_split_csv_light() {
        let dir = TempDir::new().unwrap();
        let source = write_csv(dir.path(), "sales.csv", 5);
        let splitter = FileSplitter::new(dir.path().join("out"), 2).unwrap();

        let report = splitter.split(&source, ReadStrategy::Light).unwrap();

        assert_eq!(report.format, FileFormat::Csv);
        assert_eq!((report.rows, report.chunks), (5, 3));
        assert_eq!(
            chunk_names(&report.output_dir),
            vec!["part_1.csv", "part_2.csv", "part_3.csv"]
        );
        assert_eq!(
            fs::read_to_string(report.output_dir.join("part_2.csv")).unwrap(),
            "id,value\n2,v2\n3,v3\n"
        );
    }

    #[test]
    fn test_split_csv_heavy_matches_light() {
        let dir = TempDir::new().unwrap();
        let source = write_csv(dir.path(), "big.csv", 9);

        let light = FileSplitter::new(dir.path().join("light"), 4).unwrap();
        let heavy = FileSplitter::new(dir.path().join("heavy"), 4).unwrap();
        let a = light.split(&source, ReadStrategy::Light).unwrap();
        let b = heavy.split(&source, ReadStrategy::Heavy).unwrap();

        assert_eq!((a.rows, a.chunks), (b.rows, b.chunks));
        for n in 1..=a.chunks {
            let name = format!("part_{n}.csv");
            assert_eq!(
                fs::read(a.output_dir.join(&name)).unwrap(),
                fs::read(b.output_dir.join(&name)).unwrap()
            );
        }
    }

    #[test]
    fn test_split_xlsx() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("book.xlsx");
        let table = Table::new(
            vec!["name".to_string()],
            (0..5).map(|i| vec![Cell::Text(format!("r{i}"))]).collect(),
        );
        xlsx::write_rows(&source, &table.header, &table.rows).unwrap();

        let splitter = FileSplitter::new(dir.path().join("out"), 2).unwrap();
        let report = splitter.split(&source, ReadStrategy::Light).unwrap();

        assert_eq!((report.rows, report.chunks), (5, 3));
        let last = xlsx::read_table(&report.output_dir.join("part_3.xlsx")).unwrap();
        assert_eq!(last.header, table.header);
        assert_eq!(last.rows, vec![vec![Cell::Text("r4".into())]]);
    }

    #[test]
    fn test_split_empty_csv_produces_no_chunks() {
        let dir = TempDir::new().unwrap();
        let source = write_csv(dir.path(), "empty.csv", 0);
        let splitter = FileSplitter::new(dir.path().join("out"), 3).unwrap();

        let report = splitter.split(&source, ReadStrategy::Light).unwrap();
        assert_eq!((report.rows, report.chunks), (0, 0));
        assert!(chunk_names(&report.output_dir).is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("notes.txt");
        fs::write(&source, "hello").unwrap();
        let splitter = FileSplitter::new(dir.path().join("out"), 3).unwrap();

        let err = splitter.split(&source, ReadStrategy::Light).unwrap_err();
        assert!(matches!(err, SplitError::UnsupportedFileType { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_stale_chunks_removed() {
        let dir = TempDir::new().unwrap();
        let source = write_csv(dir.path(), "data.csv", 2);
        let splitter = FileSplitter::new(dir.path().join("out"), 2).unwrap();
        let output_dir = splitter.output_dir_for(&source);

        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join("part_1.csv"), "garbage").unwrap();
        fs::write(output_dir.join("part_7.csv"), "garbage").unwrap();
        fs::write(output_dir.join("notes.md"), "keep me").unwrap();

        splitter.split(&source, ReadStrategy::Light).unwrap();

        assert_eq!(chunk_names(&output_dir), vec!["notes.md", "part_1.csv"]);
        assert_eq!(
            fs::read_to_string(output_dir.join("part_1.csv")).unwrap(),
            "id,value\n0,v0\n1,v1\n"
        );
    }
}
