use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ConfigError, ConfigSection};

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid_value(
                "environment",
                s,
                "development, testing, or production",
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn is_testing(&self) -> bool {
        matches!(self, Environment::Testing)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Debug mode default for the environment
    pub fn debug_mode(&self) -> bool {
        !self.is_production()
    }
}

/// Application-level settings shared by the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::development()
    }

    /// Create configuration for development
    pub fn development() -> Self {
        Self {
            name: "joke".to_string(),
            environment: Environment::Development,
            debug: true,
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_level: "debug".to_string(),
        }
    }

    /// Create configuration for testing
    pub fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            port: 0,
            log_level: "warn".to_string(),
            ..Self::development()
        }
    }

    /// Create configuration for production
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            debug: false,
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            ..Self::development()
        }
    }

    /// Load configuration from `JOKE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("JOKE_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Development,
        };

        let mut config = match environment {
            Environment::Development => Self::development(),
            Environment::Testing => Self::testing(),
            Environment::Production => Self::production(),
        };

        if let Ok(name) = env::var("JOKE_NAME") {
            config.name = name;
        }

        if let Ok(debug) = env::var("JOKE_DEBUG") {
            config.debug = parse_flag(&debug)
                .ok_or_else(|| ConfigError::invalid_value("debug", debug, "true or false"))?;
        }

        if let Ok(host) = env::var("JOKE_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("JOKE_PORT") {
            config.port = port.parse().map_err(|_| {
                ConfigError::invalid_value("port", port, "valid port number (0-65535)")
            })?;
        }

        if let Ok(log_level) = env::var("JOKE_LOG_LEVEL") {
            config.log_level = log_level.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.environment.is_testing() && self.port == 0 {
            return Err(ConfigError::invalid_value(
                "port",
                self.port.to_string(),
                "port between 1 and 65535",
            ));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::invalid_value(
                "log_level",
                self.log_level.clone(),
                format!("one of: {}", LOG_LEVELS.join(", ")),
            ));
        }

        if self.environment.is_production() && self.debug {
            return Err(ConfigError::invalid_value(
                "debug",
                "true",
                "false in production environment",
            ));
        }

        Ok(())
    }

    /// Get the bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSection for AppConfig {
    const SECTION: &'static str = "app";

    fn validate(&self) -> Result<(), ConfigError> {
        AppConfig::validate(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "JOKE_ENV",
            "JOKE_NAME",
            "JOKE_DEBUG",
            "JOKE_HOST",
            "JOKE_PORT",
            "JOKE_LOG_LEVEL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_port_validation_in_testing_environment() {
        let config = AppConfig::testing();
        assert_eq!(config.port, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_validation_in_non_testing_environment() {
        let mut config = AppConfig::development();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_rejects_debug() {
        let mut config = AppConfig::production();
        assert!(config.validate().is_ok());
        config.debug = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "debug"
        ));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var("JOKE_ENV", "prod");
        env::set_var("JOKE_PORT", "9000");
        env::set_var("JOKE_LOG_LEVEL", "WARN");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.debug);
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.bind_address(), "0.0.0.0:9000");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_port() {
        clear_env();
        env::set_var("JOKE_PORT", "http");

        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "port"
        ));

        clear_env();
    }

    #[test]
    fn test_app_section_from_yaml() {
        let manager =
            ConfigManager::from_yaml_str("app:\n  name: shop\n  environment: testing\n").unwrap();
        let config = manager.get::<AppConfig>().unwrap();
        assert_eq!(config.name, "shop");
        assert_eq!(config.environment, Environment::Testing);
        assert_eq!(config.host, "127.0.0.1");
    }
}
