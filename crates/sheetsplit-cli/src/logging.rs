//! Run log setup.
//!
//! Events go to stderr and are appended to `processor.log` in the log
//! directory as `<timestamp> - <LEVEL> - <message>` lines. Stderr output
//! clears the progress bar around each line.

use indicatif::ProgressBar;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Registry};

/// Name of the run log inside the log directory
pub const LOG_FILE_NAME: &str = "processor.log";

/// `<timestamp> - <LEVEL> - <message>` event format
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        SystemTime.format_time(&mut writer)?;
        write!(writer, " - {} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Stderr writer that suspends a progress bar while a line is printed
#[derive(Clone)]
pub struct BarAwareStderr {
    bar: ProgressBar,
}

impl BarAwareStderr {
    /// Writer clearing `bar` around each write
    #[must_use]
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Write for BarAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.bar.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for BarAwareStderr {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Logging state for one run.
///
/// Holds the background writer for the log file; dropping it flushes any
/// buffered lines, so keep it alive until the run is over.
pub struct LogContext {
    log_file: PathBuf,
    _guard: WorkerGuard,
}

impl LogContext {
    /// Install the global subscriber writing to stderr and `log_directory`.
    ///
    /// Stderr lines are printed with `bar` suspended.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter is invalid or a subscriber is already set.
    pub fn init(
        log_directory: &Path,
        level: &str,
        verbose: bool,
        bar: ProgressBar,
    ) -> anyhow::Result<Self> {
        let level = if verbose { "debug" } else { level };
        let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

        let appender = tracing_appender::rolling::never(log_directory, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(BarAwareStderr::new(bar));

        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_ansi(false)
            .with_writer(non_blocking);

        Registry::default()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()?;

        let log_file = log_directory.join(LOG_FILE_NAME);
        tracing::debug!("Logging to {}", log_file.display());

        Ok(Self {
            log_file,
            _guard: guard,
        })
    }

    /// Path of the run log
    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Install a stderr-only subscriber for commands that do not process files
pub fn init_console(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(if verbose { "debug" } else { "info" })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(LineFormat)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_line_format() {
        let output = capture(|| tracing::info!("Processed data.csv into 3 files"));

        let line = output.lines().next().unwrap();
        let parts: Vec<&str> = line.splitn(3, " - ").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].contains('T'), "timestamp: {}", parts[0]);
        assert_eq!(parts[1], "INFO");
        assert_eq!(parts[2], "Processed data.csv into 3 files");
    }

    #[test]
    fn test_one_line_per_event() {
        let output = capture(|| {
            tracing::warn!("Attempt 1 failed: busy");
            tracing::error!("All 3 attempts failed.");
        });

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" - WARN - Attempt 1 failed: busy"));
        assert!(lines[1].ends_with(" - ERROR - All 3 attempts failed."));
    }

    // The only test installing the global subscriber.
    #[test]
    fn test_init_appends_to_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        fs::write(&path, "earlier run\n").unwrap();

        let log = LogContext::init(dir.path(), "info", false, ProgressBar::hidden()).unwrap();
        assert_eq!(log.log_file(), path);
        tracing::info!("Processed data.csv into 2 files");
        drop(log);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "earlier run");
        assert!(
            lines[1].ends_with(" - INFO - Processed data.csv into 2 files"),
            "{contents}"
        );
    }
}
