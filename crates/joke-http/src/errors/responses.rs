//! HTTP error response formatting

use super::JokeError;
use crate::response::JokeResponse;
use axum::response::{IntoResponse, Response};
use joke_core::{ApiError, ApiErrorResponse};

impl JokeError {
    /// Get error hint for user guidance
    pub fn error_hint(&self) -> Option<String> {
        match self {
            JokeError::Core(error) => {
                std::error::Error::source(error).map(|source| source.to_string())
            }
            JokeError::InvalidRoute { .. } | JokeError::DuplicateRoute { .. } => {
                Some("Check the route definitions loaded at boot".to_string())
            }
            JokeError::WrongMiddleware { .. } => {
                Some("Middleware services must be registered as Arc<dyn Middleware>".to_string())
            }
            _ => None,
        }
    }

    /// Build the API error payload. Internal failures only expose their
    /// details when `debug` is set.
    pub fn to_api_error(&self, debug: bool) -> ApiError {
        let code = self.error_code();
        if self.status_code().is_server_error() && !debug {
            return ApiError::new(code, "Internal server error");
        }

        let error = ApiError::new(code, self.to_string());
        match self.error_hint() {
            Some(hint) => error.with_hint(hint),
            None => error,
        }
    }

    /// Convert the error into a JSON error response
    pub fn into_error_response(self, debug: bool) -> JokeResponse {
        let body = ApiErrorResponse::from(self.to_api_error(debug));
        JokeResponse::with_status(self.status_code()).json_value(
            serde_json::to_value(body).unwrap_or_else(|_| serde_json::json!({"error": {}})),
        )
    }
}

// Implement IntoResponse for automatic HTTP error responses (Axum compatibility)
impl IntoResponse for JokeError {
    fn into_response(self) -> Response {
        self.into_error_response(cfg!(debug_assertions)).into_axum_response()
    }
}
