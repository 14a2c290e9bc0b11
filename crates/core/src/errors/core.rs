use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for the joke framework
#[derive(Debug, Error)]
pub enum CoreError {
    /// A constructor or callable parameter could not be resolved
    #[error("Unable to autowire parameter '{parameter}' ({reason})")]
    Autowired {
        parameter: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The argument list itself could not be built
    #[error("Parameter resolution failed: {message}")]
    ParameterResolve { message: String },

    #[error("Circular alias detected for '{name}': {chain}")]
    CircularAlias { name: String, chain: String },

    #[error("Circular dependency detected: {path} (cycle at: {cycle_service})")]
    CircularDependency { path: String, cycle_service: String },

    #[error("Service not found: {service_type}")]
    ServiceNotFound { service_type: String },

    #[error("Service '{service}' is not of the expected type {expected}")]
    ServiceTypeMismatch { service: String, expected: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Create an autowiring error for a parameter
    pub fn autowired(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Autowired {
            parameter: parameter.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an autowiring error that wraps the failure behind it
    pub fn autowired_with_source(
        parameter: impl Into<String>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Autowired {
            parameter: parameter.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a parameter resolution error
    pub fn parameter_resolve(message: impl Into<String>) -> Self {
        Self::ParameterResolve {
            message: message.into(),
        }
    }

    /// Create a new service not found error
    pub fn service_not_found(service_type: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service_type: service_type.into(),
        }
    }

    /// Create a type mismatch error for a resolved service
    pub fn type_mismatch(service: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::ServiceTypeMismatch {
            service: service.into(),
            expected: expected.into(),
        }
    }

    /// Check if the error is an autowiring failure
    pub fn is_autowired(&self) -> bool {
        matches!(self, Self::Autowired { .. })
    }

    /// Check if the error comes from container configuration (alias or dependency cycles)
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::CircularAlias { .. } | Self::CircularDependency { .. }
        )
    }

    /// Check if the error is a missing service
    pub fn is_service(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }

    /// Stable machine-readable code used in API error payloads
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Autowired { .. } => "AUTOWIRE_ERROR",
            Self::ParameterResolve { .. } => "PARAMETER_RESOLVE_ERROR",
            Self::CircularAlias { .. } | Self::CircularDependency { .. } => "CONTAINER_ERROR",
            Self::ServiceNotFound { .. } => "SERVICE_NOT_FOUND",
            Self::ServiceTypeMismatch { .. } => "SERVICE_TYPE_MISMATCH",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// API error response structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// API error structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Add a hint to the API error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<&CoreError> for ApiError {
    fn from(error: &CoreError) -> Self {
        let api = Self::new(error.error_code(), error.to_string());
        match std::error::Error::source(error) {
            Some(source) => api.with_hint(source.to_string()),
            None => api,
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        Self { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autowired_error_message_names_parameter() {
        let error = CoreError::autowired("repository", "App\\Repository");
        assert_eq!(
            error.to_string(),
            "Unable to autowire parameter 'repository' (App\\Repository)"
        );
        assert!(error.is_autowired());
        assert!(!error.is_container());
    }

    #[test]
    fn test_api_error_carries_source_as_hint() {
        let error = CoreError::autowired_with_source(
            "config",
            "MailConfig",
            ConfigError::missing_section("mail"),
        );
        let api = ApiError::from(&error);
        assert_eq!(api.code, "AUTOWIRE_ERROR");
        assert_eq!(api.hint.as_deref(), Some("Missing configuration section: mail"));
    }

    #[test]
    fn test_api_error_serialization_skips_empty_hint() {
        let response = ApiErrorResponse::from(ApiError::new("NOT_FOUND", "Route not found"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": {"code": "NOT_FOUND", "message": "Route not found"}})
        );
    }
}
