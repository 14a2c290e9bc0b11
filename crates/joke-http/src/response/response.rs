//! Response type produced by handlers and middleware

use std::io::{self, Write};

use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::errors::{JokeError, JokeResult};

/// Response body variants
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Html(String),
    Json(serde_json::Value),
    Binary(Bytes),
}

impl ResponseBody {
    /// Default content type of the body kind
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            ResponseBody::Empty => None,
            ResponseBody::Html(_) => Some("text/html; charset=utf-8"),
            ResponseBody::Json(_) => Some("application/json"),
            ResponseBody::Binary(_) => Some("application/octet-stream"),
        }
    }

    /// Serialized body bytes
    pub fn to_bytes(&self) -> Bytes {
        match self {
            ResponseBody::Empty => Bytes::new(),
            ResponseBody::Html(html) => Bytes::from(html.clone()),
            ResponseBody::Json(value) => Bytes::from(value.to_string()),
            ResponseBody::Binary(bytes) => bytes.clone(),
        }
    }
}

/// HTTP response with a status, headers and an HTML, JSON or binary body
#[derive(Debug, Clone)]
pub struct JokeResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl JokeResponse {
    /// Create a new empty 200 response
    pub fn new() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Create response with status code
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    pub fn ok() -> Self {
        Self::new()
    }

    pub fn not_found() -> Self {
        Self::with_status(StatusCode::NOT_FOUND)
    }

    /// 200 response with an HTML body
    pub fn html<S: Into<String>>(content: S) -> Self {
        Self::new().with_html(content)
    }

    /// 200 response with a JSON body
    pub fn json_raw(value: serde_json::Value) -> Self {
        Self::new().json_value(value)
    }

    /// 200 response with serialized data
    pub fn json_ok<T: Serialize>(data: &T) -> JokeResult<Self> {
        Ok(Self::json_raw(serde_json::to_value(data)?))
    }

    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        let mut response = Self::new();
        response.set_body(ResponseBody::Binary(bytes.into()));
        response
    }

    /// Set status code
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Add a header, builder style
    pub fn header(mut self, name: &str, value: &str) -> JokeResult<Self> {
        self.add_header(name, value)?;
        Ok(self)
    }

    pub fn add_header(&mut self, name: &str, value: &str) -> JokeResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| JokeError::internal(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| JokeError::internal(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn with_html<S: Into<String>>(mut self, content: S) -> Self {
        self.set_body(ResponseBody::Html(content.into()));
        self
    }

    pub fn json_value(mut self, value: serde_json::Value) -> Self {
        self.set_body(ResponseBody::Json(value));
        self
    }

    pub fn set_body(&mut self, body: ResponseBody) {
        self.body = body;
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Body as text, for HTML and JSON bodies
    pub fn text(&self) -> Option<String> {
        match &self.body {
            ResponseBody::Html(html) => Some(html.clone()),
            ResponseBody::Json(value) => Some(value.to_string()),
            ResponseBody::Empty | ResponseBody::Binary(_) => None,
        }
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Explicit content type header, falling back to the body kind
    pub fn content_type(&self) -> Option<&str> {
        self.get_header(CONTENT_TYPE.as_str())
            .or_else(|| self.body.content_type())
    }

    /// Write a CGI-style status line and headers, a blank line, then the body
    pub fn send<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(
            writer,
            "Status: {} {}\r\n",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("")
        )?;
        if !self.headers.contains_key(CONTENT_TYPE) {
            if let Some(content_type) = self.body.content_type() {
                write!(writer, "Content-Type: {}\r\n", content_type)?;
            }
        }
        for (name, value) in &self.headers {
            writer.write_all(name.as_str().as_bytes())?;
            writer.write_all(b": ")?;
            writer.write_all(value.as_bytes())?;
            writer.write_all(b"\r\n")?;
        }
        writer.write_all(b"\r\n")?;
        writer.write_all(&self.body.to_bytes())?;
        writer.flush()
    }

    /// Convert into an axum response
    pub fn into_axum_response(self) -> Response {
        let mut headers = self.headers;
        if !headers.contains_key(CONTENT_TYPE) {
            if let Some(content_type) = self.body.content_type() {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        let mut response = Response::new(Body::from(self.body.to_bytes()));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

impl Default for JokeResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for JokeResponse {
    fn into_response(self) -> Response {
        self.into_axum_response()
    }
}
