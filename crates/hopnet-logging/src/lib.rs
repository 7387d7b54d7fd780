//! Structured logging for hopnet simulations
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines for post-run analysis (default)
//! - **Pretty Console**: Human-readable output for interactive runs
//! - **Node Context**: Every record a handler emits carries the node and the virtual time
//! - **File Output**: A JSONL run log via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use hopnet_logging::{HopnetSubscriberBuilder, LogConfig};
//!
//! // Keep the guard alive until the run is over so the file is flushed
//! let _guard = HopnetSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```

pub mod config;
pub mod context;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{NodeContextGuard, node_span};
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging setup failure
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Could not create the log directory or file
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),

    /// A global subscriber is already installed
    #[error("subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Builder for configuring and initializing the hopnet logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable pretty output.
pub struct HopnetSubscriberBuilder {
    config: LogConfig,
}

impl HopnetSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Install the subscriber globally
    ///
    /// The returned guard flushes the file writer when dropped and must be
    /// held for the whole run.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.default_level));
        let jsonl = &self.config.jsonl;
        let console = &self.config.console;

        let pretty_console = (console.enabled && console.pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(console.ansi)
                .with_target(true)
        });

        let json_console = (console.enabled && !console.pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(jsonl.include_spans)
                .flatten_event(jsonl.flatten_events)
                .with_file(jsonl.include_location)
                .with_line_number(jsonl.include_location)
        });

        let (file_layer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = file_writer(file_config)?;
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(jsonl.include_spans)
                    .flatten_event(jsonl.flatten_events)
                    .with_file(jsonl.include_location)
                    .with_line_number(jsonl.include_location)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(pretty_console)
            .with(json_console)
            .with(file_layer)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        Ok(guard)
    }

    /// Install the subscriber, reporting failures on stderr
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: logging not initialized: {}", e);
                None
            }
        }
    }
}

impl Default for HopnetSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking writer for the configured file; `Never` truncates a single file
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.directory)?;
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };
    let appender = RollingFileAppender::new(rotation, &config.directory, &config.prefix);
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = HopnetSubscriberBuilder::new();
        assert_eq!(builder.config.default_level, "info");
        assert!(!builder.config.console.pretty); // JSONL by default
    }

    #[test]
    fn test_builder_with_config() {
        let builder = HopnetSubscriberBuilder::new().with_config(LogConfig::development());
        assert_eq!(builder.config.default_level, "debug");
        assert!(builder.config.console.pretty);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = HopnetSubscriberBuilder::new()
            .with_level("trace")
            .with_console(false)
            .with_file_output(FileConfig::default());
        assert_eq!(builder.config.default_level, "trace");
        assert!(!builder.config.console.enabled);
        assert!(builder.config.file.is_some());
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path().join("logs");
        let config = FileConfig {
            directory: dir.clone(),
            prefix: "run".to_string(),
            rotation: RotationStrategy::Never,
        };
        let (_writer, guard) = file_writer(&config).unwrap();
        drop(guard);
        assert!(dir.join("run.log").exists());
    }
}
