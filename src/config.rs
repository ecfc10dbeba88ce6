//! Configuration management for Labportal
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{PortalError, Result};
use crate::telemetry::Dsn;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "LABPORTAL_CONFIG";
/// Analytics project token override
pub const ANALYTICS_TOKEN_ENV: &str = "LABPORTAL_ANALYTICS_TOKEN";
/// Telemetry endpoint override; unset or empty disables telemetry
pub const TELEMETRY_DSN_ENV: &str = "LABPORTAL_TELEMETRY_DSN";
/// Display time zone override
pub const TIMEZONE_ENV: &str = "LABPORTAL_TIMEZONE";
/// Base log level override
pub const LOG_LEVEL_ENV: &str = "LABPORTAL_LOG_LEVEL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Display formatting configuration
    pub display: DisplayConfig,

    /// Error telemetry configuration
    pub telemetry: TelemetryConfig,

    /// Analytics client configuration
    pub analytics: AnalyticsConfig,

    /// Startup sequence configuration
    pub startup: StartupConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Log directory, or a file path whose parent directory is used
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Display formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// IANA time zone used when rendering timestamps
    pub timezone: String,
}

/// Error telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Endpoint DSN; telemetry is not registered when absent
    pub dsn: Option<String>,

    /// Environment tag attached to events
    pub environment: String,

    /// Fraction of events marked for tracing (0.0..=1.0)
    pub traces_sample_rate: f64,

    /// Origins eligible for trace propagation. Entries starting with `/`
    /// match relative request paths, all others match a host name.
    pub tracing_origins: Vec<String>,
}

/// Analytics client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Project token; tracking is disabled when absent
    pub token: Option<String>,

    /// Base URL of the analytics ingestion API
    pub api_host: String,
}

/// Startup sequence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Upper bound for each awaited initialization step
    pub step_timeout_ms: u64,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first existing default location, then
    /// apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file_or_default()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file_or_default() -> Result<Self> {
        if let Some(path) = env_value(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let default_paths = ["labportal.yaml", "/etc/labportal/config.yaml"];
        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Overlay values taken from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(env_value);
    }

    /// Overlay values from an arbitrary lookup. Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup(ANALYTICS_TOKEN_ENV) {
            self.analytics.token = Some(token);
        }
        if let Some(dsn) = lookup(TELEMETRY_DSN_ENV) {
            self.telemetry.dsn = Some(dsn);
        }
        if let Some(tz) = lookup(TIMEZONE_ENV) {
            self.display.timezone = tz;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.logging.level = level;
        }
    }

    /// Parsed display time zone
    pub fn display_timezone(&self) -> Result<Tz> {
        self.display.timezone.parse::<Tz>().map_err(|_| {
            PortalError::validation(
                "display.timezone",
                format!("unknown time zone '{}'", self.display.timezone).as_str(),
            )
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        crate::logging::level::parse_log_level(&self.logging.level)
            .map_err(|_| PortalError::validation("logging.level", "Unrecognized log level"))?;

        self.display_timezone()?;

        let rate = self.telemetry.traces_sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(PortalError::validation(
                "telemetry.traces_sample_rate",
                "Must be between 0.0 and 1.0",
            ));
        }

        if let Some(dsn) = self.telemetry.dsn.as_deref()
            && Dsn::parse(dsn).is_err()
        {
            return Err(PortalError::validation(
                "telemetry.dsn",
                "Malformed DSN",
            ));
        }

        if self.analytics.api_host.trim().is_empty() {
            return Err(PortalError::validation(
                "analytics.api_host",
                "Cannot be empty",
            ));
        }

        if self.startup.step_timeout_ms == 0 {
            return Err(PortalError::validation(
                "startup.step_timeout_ms",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
