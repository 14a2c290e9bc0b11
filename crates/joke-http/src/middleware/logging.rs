//! Request logging middleware

use std::time::Instant;

use super::{Middleware, Next};
use crate::errors::JokeResult;
use crate::request::JokeRequest;
use crate::response::JokeResponse;

/// Header carrying the request id assigned by [`LoggingMiddleware`]
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs method, path, status and duration of every request under a span
/// tagged with a request id.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Echo the request id back as a response header
    expose_request_id: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id_header(mut self) -> Self {
        self.expose_request_id = true;
        self
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(&self, request: JokeRequest, next: Next) -> JokeResult<JokeResponse> {
        let request_id = request
            .header(REQUEST_ID_HEADER)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let method = request.method();
        let path = request.path().to_string();

        let span = tracing::info_span!("request", %request_id, %method, %path);
        let _entered = span.enter();
        let start = Instant::now();

        let result = next.run(request);
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(mut response) => {
                tracing::info!(status = response.status_code().as_u16(), duration_ms, "{} {}", method, path);
                if self.expose_request_id {
                    response.add_header(REQUEST_ID_HEADER, &request_id)?;
                }
                Ok(response)
            }
            Err(error) => {
                tracing::warn!(
                    status = error.status_code().as_u16(),
                    duration_ms,
                    error = %error,
                    "{} {}",
                    method,
                    path
                );
                Err(error)
            }
        }
    }

    fn name(&self) -> &'static str {
        "LoggingMiddleware"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::JokeError;
    use crate::request::HttpMethod;

    #[test]
    fn test_request_id_header() {
        let middleware = LoggingMiddleware::new().with_request_id_header();
        let request = JokeRequest::new(HttpMethod::Get, "/")
            .with_header(REQUEST_ID_HEADER, "abc-123")
            .unwrap();

        let response = middleware
            .handle(request, Next::new(|_| Ok(JokeResponse::ok())))
            .unwrap();
        assert_eq!(response.get_header(REQUEST_ID_HEADER), Some("abc-123"));

        let generated = middleware
            .handle(JokeRequest::new(HttpMethod::Get, "/"), Next::new(|_| Ok(JokeResponse::ok())))
            .unwrap();
        let id = generated.get_header(REQUEST_ID_HEADER).unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_errors_pass_through() {
        let error = LoggingMiddleware::new()
            .handle(
                JokeRequest::new(HttpMethod::Post, "/broken"),
                Next::new(|_| Err(JokeError::bad_request("nope"))),
            )
            .unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
