/// Runtime configuration
///
/// Loaded from a TOML file (`wqmon.toml` by default). Every section and
/// field is optional; a missing file yields the defaults, which describe the
/// published city water-quality CSV. `WQMON_SOURCE` and `WQMON_LOG_LEVEL`
/// (also read from `.env`) override the file.
///
/// ```toml
/// [source]
/// location = "https://example.org/water_quality.csv"
/// encodings = ["cp949", "utf-8"]
/// timeout_secs = 30
///
/// [columns]
/// river = "구분(1)"
/// station = "구분(4)"
///
/// [reshape]
/// strategy = "parity"        # or "positional_pair"
/// bod_rows = "bod_on_even"   # parity only
/// month = "2025.04"          # positional_pair only; omit for the last month
///
/// [display]
/// latest_value = "no_data"   # or "zero"
///
/// [logging]
/// level = "info"
/// file = "wqmon.log"
/// timestamps = false
/// ```

use crate::analysis::aggregate::LatestValuePolicy;
use crate::analysis::reshape::{ParityAssignment, SplitStrategy};
use crate::ingest::csv_source::{
    ColumnMapping, CsvSource, DEFAULT_ENCODINGS, DEFAULT_TIMEOUT_SECS, LoaderOptions, TextEncoding,
};
use crate::logging::LogLevel;
use crate::model::YearMonth;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "wqmon.toml";

/// File name of the city water-quality export this service was built for.
pub const DEFAULT_SOURCE_LOCATION: &str = "도시의_수질현황_20250906112341.csv";

pub const ENV_SOURCE: &str = "WQMON_SOURCE";
pub const ENV_LOG_LEVEL: &str = "WQMON_LOG_LEVEL";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub columns: ColumnMapping,
    pub reshape: ReshapeConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Local path or `http(s)://` URL.
    pub location: String,
    pub encodings: Vec<TextEncoding>,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            location: DEFAULT_SOURCE_LOCATION.to_string(),
            encodings: DEFAULT_ENCODINGS.to_vec(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Parity,
    PositionalPair,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ReshapeConfig {
    pub strategy: StrategyKind,
    pub bod_rows: ParityAssignment,
    /// `YYYY.MM` label for the positional pair.
    pub month: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub latest_value: LatestValuePolicy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            file: None,
            timestamps: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a config file. A missing file is not an error and yields defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };
    parse_config(&text, &path.display().to_string())
}

pub fn parse_config(text: &str, path: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    /// Apply environment overrides. `lookup` is `std::env::var(..).ok()` in
    /// production and a map lookup in tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(location) = lookup(ENV_SOURCE).filter(|v| !v.trim().is_empty()) {
            self.source.location = location;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = LogLevel::from_name(&level).ok_or_else(|| ConfigError::Invalid {
                field: ENV_LOG_LEVEL,
                message: format!("unknown log level '{}'", level),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.location.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "source.location",
                message: "must not be empty".to_string(),
            });
        }
        if self.source.encodings.is_empty() {
            return Err(ConfigError::Invalid {
                field: "source.encodings",
                message: "at least one encoding is required".to_string(),
            });
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "source.timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        self.split_strategy().map(|_| ())
    }

    pub fn csv_source(&self) -> CsvSource {
        CsvSource::parse(&self.source.location)
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            encodings: self.source.encodings.clone(),
            columns: self.columns.clone(),
            timeout: Duration::from_secs(self.source.timeout_secs),
        }
    }

    pub fn split_strategy(&self) -> Result<SplitStrategy, ConfigError> {
        match self.reshape.strategy {
            StrategyKind::Parity => Ok(SplitStrategy::Parity(self.reshape.bod_rows)),
            StrategyKind::PositionalPair => {
                let month = match &self.reshape.month {
                    Some(label) => Some(YearMonth::parse_label(label).ok_or_else(|| {
                        ConfigError::Invalid {
                            field: "reshape.month",
                            message: format!("'{}' is not a YYYY.MM month", label),
                        }
                    })?),
                    None => None,
                };
                Ok(SplitStrategy::PositionalPair { month })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
