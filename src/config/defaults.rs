use super::*;

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/labportal.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: "production".to_string(),
            traces_sample_rate: 1.0,
            tracing_origins: vec!["localhost".to_string(), "/".to_string()],
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_host: "https://api.mixpanel.com".to_string(),
        }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: 30_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            display: DisplayConfig::default(),
            telemetry: TelemetryConfig::default(),
            analytics: AnalyticsConfig::default(),
            startup: StartupConfig::default(),
        }
    }
}
