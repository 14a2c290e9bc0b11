//! Converts errors and panics from the inner chain into JSON error responses

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use joke_core::{AppConfig, Arguments, CoreError, Injectable, Parameter};

use super::{Middleware, Next};
use crate::errors::{JokeError, JokeResult};
use crate::request::JokeRequest;
use crate::response::JokeResponse;

/// Outermost middleware of every application, registered as `exception`
#[derive(Debug, Clone, Default)]
pub struct ExceptionMiddleware {
    debug: bool,
}

impl ExceptionMiddleware {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

impl Injectable for ExceptionMiddleware {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::config::<AppConfig>("config").optional()]
    }

    fn construct(args: &Arguments) -> Result<Self, CoreError> {
        let debug = args
            .optional_service::<AppConfig>("config")
            .map(|config| config.debug)
            .unwrap_or(false);
        Ok(Self::new(debug))
    }
}

impl Middleware for ExceptionMiddleware {
    fn handle(&self, request: JokeRequest, next: Next) -> JokeResult<JokeResponse> {
        let method = request.method();
        let path = request.path().to_string();

        let error = match catch_unwind(AssertUnwindSafe(|| next.run(request))) {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(error)) => error,
            Err(panic_info) => {
                let message = panic_message(panic_info.as_ref());
                tracing::error!(%method, %path, "Panic in request handler: {}", message);
                JokeError::internal(message)
            }
        };

        if error.status_code().is_server_error() {
            tracing::error!(%method, %path, error = %error, "Request failed");
        } else {
            tracing::debug!(%method, %path, error = %error, "Request rejected");
        }
        Ok(error.into_error_response(self.debug))
    }

    fn name(&self) -> &'static str {
        "ExceptionMiddleware"
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic occurred".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use crate::request::HttpMethod;

    fn request() -> JokeRequest {
        JokeRequest::new(HttpMethod::Get, "/missing")
    }

    #[test]
    fn test_not_found_becomes_json_404() {
        let response = ExceptionMiddleware::new(false)
            .handle(request(), Next::new(|_| Err(JokeError::route_not_found())))
            .unwrap();

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body = response.json().unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Route not found");
    }

    #[test]
    fn test_panic_details_only_in_debug() {
        let quiet = ExceptionMiddleware::new(false)
            .handle(request(), Next::new(|_| panic!("database exploded")))
            .unwrap();
        assert_eq!(quiet.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(quiet.json().unwrap()["error"]["message"], "Internal server error");

        let verbose = ExceptionMiddleware::new(true)
            .handle(request(), Next::new(|_| panic!("database exploded")))
            .unwrap();
        let message = verbose.json().unwrap()["error"]["message"].as_str().unwrap().to_string();
        assert!(message.contains("database exploded"));
    }

    #[test]
    fn test_successful_response_passes_through() {
        let response = ExceptionMiddleware::default()
            .handle(request(), Next::new(|_| Ok(JokeResponse::html("fine"))))
            .unwrap();
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text().as_deref(), Some("fine"));
    }

    #[test]
    fn test_debug_flag_from_app_config() {
        let mut args = Arguments::new();
        args.push(
            "config",
            joke_core::Value::object(AppConfig {
                debug: true,
                ..AppConfig::new()
            }),
        );
        assert!(ExceptionMiddleware::construct(&args).unwrap().debug());

        let mut args = Arguments::new();
        args.push("config", joke_core::Value::Null);
        assert!(!ExceptionMiddleware::construct(&args).unwrap().debug());
    }
}
