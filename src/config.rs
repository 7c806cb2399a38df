//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::model::OrderBy;
use crate::query::{parse_duration, CriteriaResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to criteria built by the CLI
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Bin width of group-aggregate queries, e.g. "60s"
    #[serde(default = "default_step")]
    pub default_step: String,

    /// Window ending now used when a query gives no range, e.g. "1h"
    #[serde(default = "default_lookback")]
    pub default_lookback: String,

    #[serde(default)]
    pub order_by: Option<OrderBy>,
}

fn default_step() -> String {
    "60s".to_string()
}

fn default_lookback() -> String {
    "1h".to_string()
}

impl QueryConfig {
    pub fn step(&self) -> CriteriaResult<Duration> {
        parse_duration(&self.default_step)
    }

    pub fn lookback(&self) -> CriteriaResult<Duration> {
        parse_duration(&self.default_lookback)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_step: default_step(),
            default_lookback: default_lookback(),
            order_by: None,
        }
    }
}

/// How decoded rows are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tsquery").join("config.toml")),
            Some(PathBuf::from("./tsquery.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `TSQUERY_*` overrides from `lookup`
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("TSQUERY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("TSQUERY_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Some(format) = lookup("TSQUERY_OUTPUT_FORMAT") {
            match OutputFormat::from_name(&format) {
                Some(format) => self.output.format = format,
                None => tracing::warn!("Ignoring unknown TSQUERY_OUTPUT_FORMAT '{}'", format),
            }
        }

        if let Some(step) = lookup("TSQUERY_DEFAULT_STEP") {
            self.query.default_step = step;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# tsquery Configuration
#
# Environment variables override these settings:
# - TSQUERY_LOG_LEVEL
# - TSQUERY_LOG_FORMAT
# - TSQUERY_OUTPUT_FORMAT
# - TSQUERY_DEFAULT_STEP

[query]
# Bin width of group-aggregate queries (ns, us, ms, s, m, h, d)
default_step = "60s"

# Range used when a query gives neither --from nor --to, ending now
default_lookback = "1h"

# Default row order: series or time
# order_by = "series"

[output]
# Row output: table or json
format = "table"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/tsquery/tsquery.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();

        assert_eq!(config.query.step().unwrap(), Duration::from_secs(60));
        assert_eq!(config.query.lookback().unwrap(), Duration::from_secs(3_600));
        assert_eq!(config.query.order_by, None);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[query]\norder_by = \"time\"\n\n[output]\nformat = \"json\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.query.order_by, Some(OrderBy::Time));
        assert_eq!(config.query.default_step, "60s");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load(Path::new("/nonexistent/tsquery.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"xml\"").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TSQUERY_LOG_LEVEL", "debug"),
            ("TSQUERY_OUTPUT_FORMAT", "JSON"),
            ("TSQUERY_DEFAULT_STEP", "5m"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.query.step().unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn test_unknown_output_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "TSQUERY_OUTPUT_FORMAT").then(|| "xml".to_string()));
        assert_eq!(config.output.format, OutputFormat::Table);
    }
}
