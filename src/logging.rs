/// Structured logging for the water-quality monitoring service
///
/// Provides context-rich logging with data-source and resource identifiers
/// on top of `tracing`. Console output goes to stderr so that report output
/// on stdout stays machine-readable; an optional plain-text log file can be
/// added for scheduled runs.

use crate::model::DataError;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    File,
    Http,
    Config,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File => write!(f, "FILE"),
            DataSource::Http => write!(f, "HTTP"),
            DataSource::Config => write!(f, "CFG"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected outcome - e.g. a river with no rows in the current file
    Expected,
    /// Unexpected failure - indicates a broken input or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Initialization
// ---------------------------------------------------------------------------

/// Initialize the global subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `min_level`. Calling this
/// more than once is harmless; only the first call installs a subscriber.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&str>,
    console_timestamps: bool,
) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.as_directive()));

    let console = if console_timestamps {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .boxed()
    };

    let file = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
                    .boxed(),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();

    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(source: DataSource, resource: Option<&str>, message: &str) {
    tracing::info!(source = %source, resource = resource.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(source: DataSource, resource: Option<&str>, message: &str) {
    tracing::warn!(source = %source, resource = resource.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(source: DataSource, resource: Option<&str>, message: &str) {
    tracing::error!(source = %source, resource = resource.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(source: DataSource, resource: Option<&str>, message: &str) {
    tracing::debug!(source = %source, resource = resource.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a load failure based on the error variant and its message
pub fn classify_load_failure(err: &DataError) -> FailureType {
    match err {
        // Network trouble may clear up on the next run
        DataError::ResourceUnavailable { reason, .. }
            if reason.contains("timed out") || reason.contains("Request failed") =>
        {
            FailureType::Unknown
        }
        // Missing files and HTTP status errors point at a wrong location
        DataError::ResourceUnavailable { .. } => FailureType::Unexpected,
        // Input the loader cannot interpret will not fix itself
        DataError::EncodingFailure { .. }
        | DataError::SchemaMismatch { .. }
        | DataError::Csv { .. } => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a load failure with automatic classification
pub fn log_load_failure(source: DataSource, resource: &str, operation: &str, err: &DataError) {
    let failure_type = classify_load_failure(err);
    let message = format!("{} failed: {}", operation, err);
    log_classified(source, Some(resource), failure_type, &message);
}

/// Log that a selected river has no rows; rendered as "no data", not an error
pub fn log_empty_selection(river: &str) {
    log_classified(
        DataSource::System,
        Some(river),
        FailureType::Expected,
        "selection has no data: river has no stations or series",
    );
}

/// Log at the level that matches how surprising the failure is
fn log_classified(source: DataSource, resource: Option<&str>, failure_type: FailureType, message: &str) {
    let message = format!("[{}] {}", failure_type, message);
    match failure_type {
        FailureType::Expected => info(source, resource, &message),
        FailureType::Unexpected => error(source, resource, &message),
        FailureType::Unknown => warn(source, resource, &message),
    }
}

// ---------------------------------------------------------------------------
// Load Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a completed table load
pub fn log_load_summary(
    source: DataSource,
    resource: &str,
    rows: usize,
    months: usize,
    encoding: &str,
) {
    let message = format!(
        "Load complete: {} rows x {} months (decoded as {})",
        rows, months, encoding
    );

    if rows == 0 || months == 0 {
        warn(source, Some(resource), &message);
    } else {
        info(source, Some(resource), &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::from_name("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_name("warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_name("verbose"), None);
        assert_eq!(LogLevel::Warning.as_directive(), "warn");
    }

    #[test]
    fn test_failure_classification() {
        let timeout = DataError::ResourceUnavailable {
            resource: "https://example.org/data.csv".to_string(),
            reason: "Request failed: operation timed out".to_string(),
        };
        assert_eq!(classify_load_failure(&timeout), FailureType::Unknown);

        let http_error = DataError::ResourceUnavailable {
            resource: "https://example.org/data.csv".to_string(),
            reason: "HTTP error: 404 Not Found".to_string(),
        };
        assert_eq!(classify_load_failure(&http_error), FailureType::Unexpected);

        let schema = DataError::SchemaMismatch {
            resource: "data.csv".to_string(),
            column: "구분(1)".to_string(),
        };
        assert_eq!(classify_load_failure(&schema), FailureType::Unexpected);
    }

    #[test]
    fn test_init_logger_twice_is_harmless() {
        init_logger(LogLevel::Error, None, false).expect("console-only init should succeed");
        init_logger(LogLevel::Debug, None, true).expect("second init should be a no-op");
        info(DataSource::System, None, "logger initialized");
    }

    #[test]
    fn test_every_failure_type_has_a_log_path() {
        init_logger(LogLevel::Debug, None, false).expect("console-only init should succeed");
        log_empty_selection("낙동강");
        let missing = DataError::ResourceUnavailable {
            resource: "absent.csv".to_string(),
            reason: "No such file or directory".to_string(),
        };
        log_load_failure(DataSource::File, "absent.csv", "load_table", &missing);
        info(DataSource::Config, Some("wqmon.toml"), "configuration loaded");
        assert_eq!(DataSource::Config.to_string(), "CFG");
        assert_eq!(FailureType::Expected.to_string(), "EXPECTED");
    }
}
