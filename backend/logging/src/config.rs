//! Logger configuration
//!
//! Defaults, environment overrides, YAML loading and validation for the
//! record that [`Logger::new`](crate::Logger::new) consumes.

use std::collections::HashMap;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::{warn, Level};

use crate::error::{Error, Result};
use crate::output::OutputPath;

/// strftime pattern equivalent to RFC 3339 with a numeric offset.
pub const RFC3339: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "service";

const ENV_LEVEL: &str = "SENTINEL_LOG_LEVEL";
const ENV_FORMAT: &str = "SENTINEL_LOG_FORMAT";
const ENV_OUTPUT: &str = "SENTINEL_LOG_OUTPUT";
const ENV_SERVICE: &str = "SENTINEL_SERVICE_NAME";
const ENV_TIME_FORMAT: &str = "SENTINEL_TIME_FORMAT";

/// Settings for a root logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Minimum severity that reaches the sink
    #[serde(with = "level_name")]
    pub level: Level,
    /// strftime pattern for the `time` field
    pub time_format: String,
    /// JSON objects instead of `key=value` lines
    pub json_output: bool,
    /// `stdout`, `stderr` or a file path
    pub output_path: String,
    /// Value of the `service` default field
    pub service_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            time_format: RFC3339.to_string(),
            json_output: false,
            output_path: OutputPath::Stdout.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `SENTINEL_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_env_with(&std::env::vars().collect())
    }

    /// Same as [`Config::from_env`] but reads from the given map.
    ///
    /// Unparsable values are skipped with a warning and the default kept.
    pub fn from_env_with(env: &HashMap<String, String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = env.get(ENV_LEVEL) {
            match parse_level(level) {
                Ok(level) => config.level = level,
                Err(e) => warn!(var = ENV_LEVEL, error = %e, "Ignoring log level override"),
            }
        }

        if let Some(format) = env.get(ENV_FORMAT) {
            match format.to_ascii_lowercase().as_str() {
                "json" => config.json_output = true,
                "text" => config.json_output = false,
                other => warn!(
                    var = ENV_FORMAT,
                    value = other,
                    "Unknown log format; expected 'json' or 'text'"
                ),
            }
        }

        if let Some(output) = env.get(ENV_OUTPUT).filter(|v| !v.is_empty()) {
            config.output_path = output.clone();
        }
        if let Some(service) = env.get(ENV_SERVICE).filter(|v| !v.is_empty()) {
            config.service_name = service.clone();
        }
        if let Some(time_format) = env.get(ENV_TIME_FORMAT) {
            match validate_time_format(time_format) {
                Ok(()) => config.time_format = time_format.clone(),
                Err(e) => warn!(var = ENV_TIME_FORMAT, error = %e, "Ignoring time format override"),
            }
        }

        config
    }

    /// Read a YAML config file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_yaml_str(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Check the fields that cannot be verified by opening the output.
    ///
    /// The output path is left to [`open_output`](crate::output::open_output):
    /// any non-symbolic value is a file name and only the filesystem decides.
    pub fn validate(&self) -> Result<()> {
        validate_time_format(&self.time_format)
    }
}

/// Parse a level name such as `info` or `WARN`.
///
/// Only the four levels the logger emits are accepted.
pub fn parse_level(value: &str) -> Result<Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::InvalidLevel(value.to_string())),
    }
}

/// Reject patterns chrono cannot render.
pub fn validate_time_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidTimeFormat {
            format: format.to_string(),
            message: "unrecognized strftime specifier".to_string(),
        });
    }
    Ok(())
}

mod level_name {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_level(&raw).map_err(serde::de::Error::custom)
    }
}
