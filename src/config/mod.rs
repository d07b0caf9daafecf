//! Configuration management for hostrota
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Command-line flags override both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::export::ExportFormat;
use crate::scheduler::DisplayFilter;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store configuration
    pub database: DatabaseConfig,

    /// Scheduler view configuration
    pub scheduler: SchedulerConfig,

    /// Export configuration
    pub export: ExportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// Scheduler view configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Include candidates who did not volunteer to host
    pub show_all_candidates: bool,
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for exports written without an explicit path
    pub output_dir: PathBuf,

    /// Label language (en, ko)
    pub locale: String,

    /// Format used when none is given
    pub default_format: ExportFormat,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/hostrota.db"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            show_all_candidates: false,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            locale: String::from("en"),
            default_format: ExportFormat::Csv,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];
const LOCALES: [&str; 2] = ["en", "ko"];

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let sqlite_path = std::env::var("HOSTROTA_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database.sqlite_path);

        let show_all_candidates = std::env::var("HOSTROTA_SHOW_ALL_CANDIDATES")
            .ok()
            .and_then(|v| crate::utils::parse_boolish(&v))
            .unwrap_or(defaults.scheduler.show_all_candidates);

        let output_dir = std::env::var("HOSTROTA_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.export.output_dir);

        let locale = std::env::var("HOSTROTA_LANG").unwrap_or(defaults.export.locale);

        let default_format = std::env::var("HOSTROTA_EXPORT_FORMAT")
            .ok()
            .and_then(|v| v.parse::<ExportFormat>().ok())
            .unwrap_or(defaults.export.default_format);

        let log_level =
            std::env::var("HOSTROTA_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("HOSTROTA_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            database: DatabaseConfig { sqlite_path },
            scheduler: SchedulerConfig {
                show_all_candidates,
            },
            export: ExportConfig {
                output_dir,
                locale,
                default_format,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.sqlite_path.as_os_str().is_empty() {
            anyhow::bail!("database.sqlite_path must not be empty");
        }

        if !LOCALES.contains(&crate::i18n::normalize_locale(&self.export.locale).as_str()) {
            anyhow::bail!("export.locale '{}' is not supported", self.export.locale);
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Display filter implied by the scheduler section
    #[must_use]
    pub fn display_filter(&self) -> DisplayFilter {
        if self.scheduler.show_all_candidates {
            DisplayFilter::All
        } else {
            DisplayFilter::CanHostOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.display_filter(), DisplayFilter::CanHostOnly);
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            show_all_candidates = true

            [export]
            locale = "ko"
            default_format = "xlsx"
            "#,
        )
        .unwrap();

        assert_eq!(config.display_filter(), DisplayFilter::All);
        assert_eq!(config.export.default_format, ExportFormat::Xlsx);
        assert_eq!(config.database.sqlite_path, PathBuf::from("data/hostrota.db"));
        assert!(config.validate().is_ok());
    }
}
