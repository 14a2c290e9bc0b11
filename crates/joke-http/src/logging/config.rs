//! # Structured Logging
//!
//! `tracing-subscriber` setup with text, pretty and JSON output, driven by
//! presets or the application configuration.

use std::io;

use joke_core::{AppConfig, Environment};
use serde_json::{json, Value};
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// JSON structured logging instead of text
    pub json_format: bool,
    /// Multi-line human readable output
    pub pretty_print: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Fields logged with the initialization message
    pub global_fields: serde_json::Map<String, Value>,
    /// Environment filter (supports directives like "joke_http=debug,tower_http=info")
    pub env_filter: Option<String>,
    pub service_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_print: false,
            include_location: false,
            global_fields: serde_json::Map::new(),
            env_filter: None,
            service_name: None,
        }
    }
}

impl LoggingConfig {
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            env_filter: Some("joke=info,joke_core=info,joke_http=info,tower_http=warn".to_string()),
            ..Self::default()
        }
        .with_global_field("env", "production")
    }

    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            pretty_print: true,
            include_location: true,
            env_filter: Some(
                "joke=debug,joke_core=debug,joke_http=debug,tower_http=debug".to_string(),
            ),
            ..Self::default()
        }
        .with_global_field("env", "development")
    }

    /// Minimal output for test runs
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            env_filter: Some("joke_http=error".to_string()),
            ..Self::default()
        }
        .with_global_field("env", "test")
    }

    /// Preset matching the application's environment, at its log level
    pub fn from_app_config(config: &AppConfig) -> Self {
        let preset = match config.environment {
            Environment::Production => Self::production(),
            Environment::Testing => Self::test(),
            Environment::Development => Self::development(),
        };
        Self {
            level: config.log_level.clone(),
            env_filter: None,
            service_name: Some(config.name.clone()),
            ..preset
        }
    }

    pub fn with_global_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.global_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_service(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The filter directives in effect, `RUST_LOG` aside
    pub fn filter_directives(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directives()))?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_format {
        registry
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .json(),
            )
            .try_init()?;
    } else if config.pretty_print {
        registry
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .pretty(),
            )
            .try_init()?;
    } else {
        registry
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init()?;
    }

    let mut init_msg = json!({
        "message": "Structured logging initialized",
        "level": config.level,
        "format": if config.json_format { "json" } else if config.pretty_print { "pretty" } else { "text" },
    });
    if let Some(name) = &config.service_name {
        init_msg["service_name"] = json!(name);
    }
    for (key, value) in config.global_fields {
        init_msg[key] = value;
    }
    tracing::info!(target: "joke::logging", "{}", init_msg);

    Ok(())
}

/// Log application startup with system information
pub fn log_startup_info(service_name: &str, address: &str) {
    let startup_info = json!({
        "event": "application_startup",
        "service": service_name,
        "version": joke_core::VERSION,
        "address": address,
        "pid": std::process::id(),
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
    });

    tracing::info!(target: "joke::startup", "{}", startup_info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let production = LoggingConfig::production();
        assert!(production.json_format);
        assert_eq!(production.global_fields["env"], "production");

        let development = LoggingConfig::development();
        assert!(development.pretty_print && development.include_location);

        assert_eq!(LoggingConfig::test().filter_directives(), "joke_http=error");
        assert_eq!(LoggingConfig::default().filter_directives(), "info");
    }

    #[test]
    fn test_from_app_config_uses_level() {
        let config = AppConfig {
            log_level: "warn".to_string(),
            ..AppConfig::production()
        };
        let logging = LoggingConfig::from_app_config(&config);
        assert!(logging.json_format);
        assert_eq!(logging.filter_directives(), "warn");
        assert_eq!(logging.service_name.as_deref(), Some(config.name.as_str()));
    }

    #[test]
    fn test_init_twice_fails() {
        // The first call may lose to another test's subscriber; the second never wins
        let _ = init_logging(LoggingConfig::test());
        assert!(init_logging(LoggingConfig::test()).is_err());
    }
}
