pub mod config;
pub mod container;
pub mod errors;
pub mod value;

// Re-export key types for convenience
pub use config::{AppConfig, ConfigError, ConfigManager, ConfigSection, Environment};
pub use container::{
    Arguments, Constructor, DependencyContainer, Injectable, ParamType, Parameter,
    ParameterResolver, ResolveContext, ServiceContainer, ServiceDefinition, ServiceScope,
    TryFromValue,
};
pub use errors::{ApiError, ApiErrorResponse, CoreError};
pub use value::{ServiceRef, Value};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "joke";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

/// Get framework name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}
