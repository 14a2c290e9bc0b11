//! Conversion of handler return values into responses

use joke_core::Value;
use serde::Serialize;

use super::JokeResponse;
use crate::errors::{JokeError, JokeResult};

/// What a route handler produced
#[derive(Debug, Clone)]
pub enum HandlerOutput {
    Response(JokeResponse),
    Json(serde_json::Value),
    Text(String),
}

impl HandlerOutput {
    /// Wrap into a response: JSON values become JSON responses, text
    /// becomes an HTML response
    pub fn into_response(self) -> JokeResponse {
        match self {
            HandlerOutput::Response(response) => response,
            HandlerOutput::Json(value) => JokeResponse::json_raw(value),
            HandlerOutput::Text(text) => JokeResponse::html(text),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HandlerOutput::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Values a handler may return
pub trait Responder {
    fn into_output(self) -> JokeResult<HandlerOutput>;
}

impl Responder for HandlerOutput {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(self)
    }
}

impl Responder for JokeResponse {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Response(self))
    }
}

impl Responder for String {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Text(self))
    }
}

impl Responder for &'static str {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Text(self.to_string()))
    }
}

impl Responder for serde_json::Value {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Json(self))
    }
}

/// Lists are sent as JSON arrays
impl<T: Serialize> Responder for Vec<T> {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Json(serde_json::to_value(self)?))
    }
}

macro_rules! display_responder {
    ($($ty:ty),*) => {
        $(
            impl Responder for $ty {
                fn into_output(self) -> JokeResult<HandlerOutput> {
                    Ok(HandlerOutput::Text(self.to_string()))
                }
            }
        )*
    };
}

display_responder!(i32, i64, u32, u64, f64);

/// Booleans use the same string cast as resolved values: `"1"` or `""`
impl Responder for bool {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Text(
            Value::Bool(self).to_string_value().unwrap_or_default(),
        ))
    }
}

/// Serialize any value as a JSON response
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn into_output(self) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Json(serde_json::to_value(self.0)?))
    }
}

impl<R, E> Responder for Result<R, E>
where
    R: Responder,
    E: Into<JokeError>,
{
    fn into_output(self) -> JokeResult<HandlerOutput> {
        match self {
            Ok(value) => value.into_output(),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseBody;
    use joke_core::CoreError;
    use serde_json::json;

    #[test]
    fn test_text_becomes_html() {
        let response = "Hi Alex".into_output().unwrap().into_response();
        assert_eq!(response.body(), &ResponseBody::Html("Hi Alex".to_string()));
    }

    #[test]
    fn test_lists_become_json() {
        let response = vec!["a", "b"].into_output().unwrap().into_response();
        assert_eq!(response.json(), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_numbers_are_string_cast() {
        assert_eq!(42_i64.into_output().unwrap().as_text(), Some("42"));
    }

    #[test]
    fn test_booleans_match_value_cast() {
        assert_eq!(true.into_output().unwrap().as_text(), Some("1"));
        assert_eq!(false.into_output().unwrap().as_text(), Some(""));
        assert_eq!(
            false.into_output().unwrap().as_text().map(str::to_string),
            Value::Bool(false).to_string_value()
        );
    }

    #[test]
    fn test_errors_propagate() {
        let result: Result<String, CoreError> = Err(CoreError::autowired("id", "scalar"));
        assert!(matches!(result.into_output(), Err(JokeError::Core(_))));
    }
}
