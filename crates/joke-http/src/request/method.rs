//! HTTP methods understood by the router

use std::fmt;
use std::str::FromStr;

use axum::http::{Method, StatusCode};

use crate::errors::JokeError;

/// Methods a route can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl HttpMethod {
    /// Every routable method; what `any` registers for
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
    ];

    /// Get method as string
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Lowercase name, as used in generated route names
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Head => "head",
        }
    }

    /// Check if method is safe (GET, HEAD)
    pub fn is_safe(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl FromStr for HttpMethod {
    type Err = JokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                JokeError::http(
                    StatusCode::METHOD_NOT_ALLOWED,
                    format!("Method {} is not supported", s),
                )
            })
    }
}

impl TryFrom<&Method> for HttpMethod {
    type Error = JokeError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Head => Method::HEAD,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
    }

    #[test]
    fn test_unsupported_method() {
        let error = "OPTIONS".parse::<HttpMethod>().unwrap_err();
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_axum_conversion() {
        assert_eq!(HttpMethod::try_from(&Method::DELETE).unwrap(), HttpMethod::Delete);
        assert_eq!(Method::from(HttpMethod::Head), Method::HEAD);
    }
}
