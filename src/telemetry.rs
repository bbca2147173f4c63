//! Tracing subscriber setup for binaries built on this crate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use azure_authorizer::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Invalid log level: {0}. Valid options: trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::WARN,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    fn default_directives(&self) -> String {
        let level = self.log_level.as_str().to_lowercase();
        format!("azure_authorizer={level},azauth={level}")
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, TelemetryError> {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => return Err(TelemetryError::InvalidLevel(level.to_string())),
        };
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::WARN),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the configured level. The returned guard must be kept alive
/// while logging to a file, or buffered lines are lost.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().ok_or_else(|| {
                TelemetryError::Init(format!("log file path has no file name: {}", path.display()))
            })?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name.to_string_lossy())
                .build(dir)
                .map_err(|e| TelemetryError::Init(format!("{}: {e}", path.display())))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let init_result = match config.output_format {
        OutputFormat::Json => builder.json().try_init(),
        OutputFormat::Text => builder.try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("global default trace dispatcher has already been set") {
                // Tracing is already initialized, which is fine
                Ok(guard)
            } else {
                Err(TelemetryError::Init(error_msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        let cfg = SubscriberConfig::builder()
            .log_level_str("DEBUG")
            .unwrap()
            .build();
        assert_eq!(cfg.log_level, tracing::Level::DEBUG);
        assert_eq!(
            SubscriberConfig::builder().log_level_str("loud").unwrap_err(),
            TelemetryError::InvalidLevel("loud".into())
        );
    }

    #[test]
    fn default_directives_cover_lib_and_bin() {
        let cfg = SubscriberConfig::builder()
            .log_level(tracing::Level::INFO)
            .build();
        assert_eq!(cfg.default_directives(), "azure_authorizer=info,azauth=info");
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let cfg = SubscriberConfig::builder()
            .log_file(PathBuf::from("/proc/no_such_dir/azauth.log"))
            .build();
        let err = init_subscriber(cfg).unwrap_err();
        assert!(matches!(err, TelemetryError::Init(ref m) if m.contains("azauth.log")), "{err:?}");
    }

    #[test]
    fn init_twice_is_harmless() {
        let _ = init_subscriber(SubscriberConfig::default());
        assert!(init_subscriber(SubscriberConfig::default()).is_ok());
    }
}
