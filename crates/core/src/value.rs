//! Dynamic values exchanged between the router, the resolver and handlers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased service instance
pub type ServiceRef = Arc<dyn Any + Send + Sync>;

/// A resolved argument or context entry
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(ServiceRef),
}

impl Value {
    /// Wrap any shareable value as an object
    pub fn object<T: Send + Sync + 'static>(value: T) -> Self {
        Value::Object(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type label for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer cast: numbers truncate, numeric strings are parsed
    pub fn to_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    /// Float cast: numbers widen, numeric strings are parsed
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Boolean cast accepting the usual form/query spellings
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::Null => Some(false),
            Value::Str(s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(true),
                "0" | "" | "false" | "off" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// String cast; objects and lists have no string form
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(if *b { "1".to_string() } else { String::new() }),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::List(_) | Value::Object(_) => None,
        }
    }

    /// Downcast an object value to its concrete type
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self {
            Value::Object(object) => Arc::clone(object).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(_) => write!(f, "Object(<service>)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_string_value() {
            Some(s) => write!(f, "{s}"),
            None => write!(f, "<{}>", self.kind()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_casts_from_strings() {
        assert_eq!(Value::from("12").to_int(), Some(12));
        assert_eq!(Value::from("12.7").to_int(), Some(12));
        assert_eq!(Value::from(" 12.3 ").to_float(), Some(12.3));
        assert_eq!(Value::from("twelve").to_int(), None);
        assert_eq!(Value::from("inf").to_int(), None);
    }

    #[test]
    fn test_bool_cast() {
        assert_eq!(Value::from("on").to_bool(), Some(true));
        assert_eq!(Value::from("0").to_bool(), Some(false));
        assert_eq!(Value::from("maybe").to_bool(), None);
    }

    #[test]
    fn test_object_identity_and_downcast() {
        let value = Value::object(String::from("inner"));
        let copy = value.clone();
        assert_eq!(value, copy);
        assert_eq!(value.downcast::<String>().as_deref().map(String::as_str), Some("inner"));
        assert!(value.downcast::<u32>().is_none());
        assert_eq!(value.to_string(), "<object>");
    }
}
