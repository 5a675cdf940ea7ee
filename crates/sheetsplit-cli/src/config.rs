//! Configuration system for the sheetsplit CLI.

use serde::{Deserialize, Serialize};
use sheetsplit_files::{DispatchPolicy, ProcessorSettings, RetryPolicy};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// sheetsplit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for files to split
    #[serde(default = "default_input_directory")]
    pub input_directory: PathBuf,
    /// Root directory for chunk files
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Directory receiving processed originals
    #[serde(default = "default_archive_directory")]
    pub archive_directory: PathBuf,
    /// Directory holding `processor.log`
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    /// Files below this size (MB) take the light path
    #[serde(default = "default_threshold_mb", alias = "pandas_threshold_mb")]
    pub light_threshold_mb: f64,
    /// Maximum rows per chunk file
    #[serde(default = "default_rows_per_file")]
    pub rows_per_file: usize,
    /// Worker pool size (0 = one per CPU)
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,
    /// Split attempts per file
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between split attempts
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
    /// Split files at or above the threshold instead of rejecting them
    #[serde(default)]
    pub heavy_path_enabled: bool,
    /// How files are dispatched
    #[serde(default)]
    pub dispatch_policy: DispatchPolicy,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default values

fn default_input_directory() -> PathBuf {
    PathBuf::from("data/input")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_archive_directory() -> PathBuf {
    PathBuf::from("data/archive")
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_threshold_mb() -> f64 {
    50.0
}

fn default_rows_per_file() -> usize {
    sheetsplit_files::DEFAULT_ROWS_PER_FILE
}

fn default_max_concurrent_files() -> usize {
    4
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_seconds() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_directory: default_input_directory(),
            output_directory: default_output_directory(),
            archive_directory: default_archive_directory(),
            log_directory: default_log_directory(),
            light_threshold_mb: default_threshold_mb(),
            rows_per_file: default_rows_per_file(),
            max_concurrent_files: default_max_concurrent_files(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay_seconds(),
            heavy_path_enabled: false,
            dispatch_policy: DispatchPolicy::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("config/settings.toml")
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.light_threshold_mb.is_finite() || self.light_threshold_mb <= 0.0 {
            anyhow::bail!(
                "light_threshold_mb must be a positive number, got {}",
                self.light_threshold_mb
            );
        }

        if self.rows_per_file == 0 {
            anyhow::bail!("rows_per_file must be greater than zero");
        }

        if self.max_concurrent_files > 1000 {
            anyhow::bail!("max_concurrent_files must be between 0 (auto) and 1000");
        }

        if self.max_retries == 0 {
            anyhow::bail!("max_retries must be at least 1");
        }

        // Archiving into the input directory would reprocess files forever
        for (name, dir) in [
            ("output_directory", &self.output_directory),
            ("archive_directory", &self.archive_directory),
        ] {
            if dir == &self.input_directory {
                anyhow::bail!("{} must differ from input_directory", name);
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Create the output, archive and log directories
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [
            &self.output_directory,
            &self.archive_directory,
            &self.log_directory,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Retry policy for split attempts
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs(self.retry_delay_seconds),
        )
    }

    /// Settings for the file processor
    #[must_use]
    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            output_directory: self.output_directory.clone(),
            archive_directory: self.archive_directory.clone(),
            light_threshold_mb: self.light_threshold_mb,
            rows_per_file: self.rows_per_file,
            heavy_path_enabled: self.heavy_path_enabled,
            retry: self.retry_policy(),
        }
    }
}
