//! Error types for routing, dispatch and the middleware pipeline.

use axum::http::StatusCode;
use joke_core::CoreError;
use thiserror::Error;

use crate::routing::pattern::RoutePatternError;

/// Result type for HTTP operations
pub type JokeResult<T> = Result<T, JokeError>;

/// Framework errors raised while handling a request
#[derive(Error, Debug)]
pub enum JokeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{message}")]
    NotFound { message: String },

    #[error("Middleware '{middleware}' does not implement the middleware interface")]
    WrongMiddleware { middleware: String },

    #[error("Invalid route pattern '{pattern}': {source}")]
    InvalidRoute {
        pattern: String,
        #[source]
        source: RoutePatternError,
    },

    #[error("Route name '{name}' is already registered")]
    DuplicateRoute { name: String },

    /// A domain error carrying its own response status
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl JokeError {
    /// Create a not found error
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        JokeError::NotFound {
            message: message.into(),
        }
    }

    /// The error raised when no route matches a request
    pub fn route_not_found() -> Self {
        Self::not_found("Route not found")
    }

    pub fn wrong_middleware<T: Into<String>>(middleware: T) -> Self {
        JokeError::WrongMiddleware {
            middleware: middleware.into(),
        }
    }

    pub fn invalid_route<T: Into<String>>(pattern: T, source: RoutePatternError) -> Self {
        JokeError::InvalidRoute {
            pattern: pattern.into(),
            source,
        }
    }

    pub fn duplicate_route<T: Into<String>>(name: T) -> Self {
        JokeError::DuplicateRoute { name: name.into() }
    }

    /// Create an error with an explicit response status
    pub fn http<T: Into<String>>(status: StatusCode, message: T) -> Self {
        JokeError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::http(StatusCode::FORBIDDEN, message)
    }

    /// Create an internal error
    pub fn internal<T: Into<String>>(message: T) -> Self {
        JokeError::Internal {
            message: message.into(),
        }
    }

    /// Wrap any other error
    pub fn other<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        JokeError::Other(Box::new(error))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, JokeError::NotFound { .. })
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            JokeError::NotFound { .. } => StatusCode::NOT_FOUND,
            JokeError::Http { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for consistent API responses
    pub fn error_code(&self) -> String {
        match self {
            JokeError::Core(error) => error.error_code().to_string(),
            JokeError::NotFound { .. } => "NOT_FOUND".to_string(),
            JokeError::WrongMiddleware { .. } => "WRONG_MIDDLEWARE".to_string(),
            JokeError::InvalidRoute { .. } => "INVALID_ROUTE".to_string(),
            JokeError::DuplicateRoute { .. } => "DUPLICATE_ROUTE".to_string(),
            JokeError::Http { status, .. } => status
                .canonical_reason()
                .map(|reason| reason.to_uppercase().replace([' ', '-'], "_"))
                .unwrap_or_else(|| format!("HTTP_{}", status.as_u16())),
            JokeError::Internal { .. } | JokeError::Other(_) => "INTERNAL_ERROR".to_string(),
        }
    }
}

// Convert from joke-core ConfigError
impl From<joke_core::ConfigError> for JokeError {
    fn from(err: joke_core::ConfigError) -> Self {
        JokeError::Core(CoreError::Config(err))
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for JokeError {
    fn from(err: serde_json::Error) -> Self {
        JokeError::Internal {
            message: format!("JSON serialization error: {}", err),
        }
    }
}
