//! Request wrapper consumed by the router, middleware and handlers

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use super::HttpMethod;
use crate::errors::{JokeError, JokeResult};

/// An incoming request with its normalised path and the parameters
/// captured by the matching route.
#[derive(Debug, Clone)]
pub struct JokeRequest {
    method: HttpMethod,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
    route_params: HashMap<String, String>,
}

impl JokeRequest {
    /// Create a request from a method and a request target such as
    /// `/users/42?tab=posts`
    pub fn new(method: HttpMethod, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        Self {
            method,
            path: normalize_path(path),
            query: query.map(parse_query).unwrap_or_default(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            route_params: HashMap::new(),
        }
    }

    /// Build from the parts the host server hands over
    pub fn from_parts(method: HttpMethod, target: &str, headers: HeaderMap, body: Bytes) -> Self {
        let mut request = Self::new(method, target);
        request.headers = headers;
        request.body = body;
        request
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path without query string, always starting with `/` and without a
    /// trailing slash (except for the root)
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Add a header, builder style
    pub fn with_header(mut self, name: &str, value: &str) -> JokeResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| JokeError::bad_request(format!("Invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| JokeError::bad_request(format!("Invalid value for header {}", name)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Check if the request carries JSON
    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"))
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> JokeResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| JokeError::bad_request(format!("Invalid JSON body: {}", e)))
    }

    /// Deserialize the body as a URL-encoded form
    pub fn form<T: DeserializeOwned>(&self) -> JokeResult<T> {
        serde_urlencoded::from_bytes(&self.body)
            .map_err(|e| JokeError::bad_request(format!("Invalid form body: {}", e)))
    }

    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params.get(name).map(String::as_str)
    }

    pub fn route_params(&self) -> &HashMap<String, String> {
        &self.route_params
    }

    /// Replace the captured route parameters
    pub fn set_route_params(&mut self, params: HashMap<String, String>) {
        self.route_params = params;
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(error) => {
            tracing::debug!(query, %error, "ignoring malformed query string");
            HashMap::new()
        }
    }
}
