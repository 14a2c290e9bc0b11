//! Declared parameter schemas, the per-call resolution context and the
//! resolved argument list handed to constructors and handlers.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigError, ConfigManager, ConfigSection};
use crate::errors::CoreError;
use crate::value::{ServiceRef, Value};

/// Types that can be built from a raw context value, such as an enum bound
/// from a route segment.
pub trait TryFromValue: Sized + Send + Sync + 'static {
    fn try_from_value(value: &Value) -> Option<Self>;
}

/// Declared type of a parameter
#[derive(Clone)]
pub enum ParamType {
    /// Untyped; the raw context value is used as is
    Mixed,
    Str,
    Int,
    Float,
    Bool,
    /// A service registered in the container under this name
    Service(String),
    /// A configuration section, loaded through the `ConfigManager` as a fallback
    Config {
        type_name: &'static str,
        load: fn(&ConfigManager) -> Result<ServiceRef, ConfigError>,
    },
    /// A type with a `TryFromValue` conversion
    Convertible {
        type_name: &'static str,
        convert: fn(&Value) -> Option<Value>,
    },
    /// Union type; the names are only used for diagnostics
    Union(Vec<&'static str>),
    /// Intersection type; the names are only used for diagnostics
    Intersection(Vec<&'static str>),
}

impl ParamType {
    /// Human readable type name
    pub fn type_name(&self) -> String {
        match self {
            ParamType::Mixed => "mixed".to_string(),
            ParamType::Str => "string".to_string(),
            ParamType::Int => "int".to_string(),
            ParamType::Float => "float".to_string(),
            ParamType::Bool => "bool".to_string(),
            ParamType::Service(name) => name.clone(),
            ParamType::Config { type_name, .. } | ParamType::Convertible { type_name, .. } => {
                (*type_name).to_string()
            }
            ParamType::Union(names) => names.join("|"),
            ParamType::Intersection(names) => names.join("&"),
        }
    }

    /// Whether the type is a scalar the resolver can cast to
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ParamType::Str | ParamType::Int | ParamType::Float | ParamType::Bool
        )
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamType({})", self.type_name())
    }
}

fn convert_value<T: TryFromValue>(value: &Value) -> Option<Value> {
    T::try_from_value(value).map(Value::object)
}

fn load_section<C: ConfigSection>(manager: &ConfigManager) -> Result<ServiceRef, ConfigError> {
    let section: ServiceRef = manager.get::<C>()?;
    Ok(section)
}

/// One declared parameter of a constructor, factory or handler
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn mixed(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Mixed)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Str)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Float)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Bool)
    }

    /// A service resolved by its type name. Works for trait objects too,
    /// e.g. `Parameter::service::<dyn Mailer>("mailer")`.
    pub fn service<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Service(type_name::<T>().to_string()))
    }

    /// A service resolved by an explicit container key
    pub fn named_service(name: impl Into<String>, service: impl Into<String>) -> Self {
        Self::new(name, ParamType::Service(service.into()))
    }

    pub fn config<C: ConfigSection>(name: impl Into<String>) -> Self {
        Self::new(
            name,
            ParamType::Config {
                type_name: type_name::<C>(),
                load: load_section::<C>,
            },
        )
    }

    pub fn convertible<T: TryFromValue>(name: impl Into<String>) -> Self {
        Self::new(
            name,
            ParamType::Convertible {
                type_name: type_name::<T>(),
                convert: convert_value::<T>,
            },
        )
    }

    pub fn union(name: impl Into<String>, types: Vec<&'static str>) -> Self {
        Self::new(name, ParamType::Union(types))
    }

    pub fn intersection(name: impl Into<String>, types: Vec<&'static str>) -> Self {
        Self::new(name, ParamType::Intersection(types))
    }

    /// Value used when neither the context nor the container can supply one
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Shorthand for a `Null` default, making a service parameter optional
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }
}

/// Values available to the resolver by parameter name, plus request-scoped
/// services looked up before the container.
#[derive(Clone, Default)]
pub struct ResolveContext {
    values: HashMap<String, Value>,
    services: HashMap<String, ServiceRef>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from string pairs, such as captured route parameters
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = params
            .into_iter()
            .map(|(key, value)| (key.into(), Value::Str(value.into())))
            .collect();
        Self {
            values,
            services: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Provide a request-scoped service under its type name
    pub fn provide<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(type_name::<T>().to_string(), service);
    }

    /// Provide a request-scoped service under an explicit key
    pub fn provide_named(&mut self, name: impl Into<String>, service: ServiceRef) {
        self.services.insert(name.into(), service);
    }

    pub fn service(&self, name: &str) -> Option<&ServiceRef> {
        self.services.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ResolveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("values", &self.values)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolved arguments, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.values.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Argument by position
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().map(|(_, value)| value)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values.into_iter().map(|(_, value)| value).collect()
    }

    fn required(&self, name: &str) -> Result<&Value, CoreError> {
        self.get(name)
            .ok_or_else(|| CoreError::parameter_resolve(format!("missing argument '{name}'")))
    }

    pub fn string(&self, name: &str) -> Result<String, CoreError> {
        self.required(name)?
            .to_string_value()
            .ok_or_else(|| CoreError::type_mismatch(name, "string"))
    }

    pub fn int(&self, name: &str) -> Result<i64, CoreError> {
        self.required(name)?
            .to_int()
            .ok_or_else(|| CoreError::type_mismatch(name, "int"))
    }

    pub fn float(&self, name: &str) -> Result<f64, CoreError> {
        self.required(name)?
            .to_float()
            .ok_or_else(|| CoreError::type_mismatch(name, "float"))
    }

    pub fn bool(&self, name: &str) -> Result<bool, CoreError> {
        self.required(name)?
            .to_bool()
            .ok_or_else(|| CoreError::type_mismatch(name, "bool"))
    }

    /// A concrete service or converted value
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, CoreError> {
        self.required(name)?
            .downcast::<T>()
            .ok_or_else(|| CoreError::type_mismatch(name, type_name::<T>()))
    }

    /// A trait-object service registered with `singleton_as`
    pub fn shared<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, CoreError> {
        self.required(name)?
            .downcast::<Arc<T>>()
            .map(|inner| Arc::clone(&*inner))
            .ok_or_else(|| CoreError::type_mismatch(name, type_name::<T>()))
    }

    /// A service parameter that may have fallen back to a `Null` default
    pub fn optional_service<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(Value::downcast::<T>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Status {
        Open,
        Closed,
    }

    impl TryFromValue for Status {
        fn try_from_value(value: &Value) -> Option<Self> {
            match value.as_str()? {
                "open" => Some(Status::Open),
                "closed" => Some(Status::Closed),
                _ => None,
            }
        }
    }

    #[test]
    fn test_type_names_for_diagnostics() {
        assert_eq!(Parameter::union("id", vec!["int", "string"]).ty.type_name(), "int|string");
        assert_eq!(
            Parameter::intersection("x", vec!["Countable", "Traversable"]).ty.type_name(),
            "Countable&Traversable"
        );
        assert_eq!(Parameter::float("amount").ty.type_name(), "float");
        assert!(Parameter::float("amount").ty.is_scalar());
        assert!(!Parameter::mixed("anything").ty.is_scalar());
    }

    #[test]
    fn test_convertible_parameter_uses_try_from_value() {
        let parameter = Parameter::convertible::<Status>("status");
        let ParamType::Convertible { convert, .. } = parameter.ty else {
            panic!("expected a convertible parameter");
        };
        let converted = convert(&Value::from("closed")).unwrap();
        assert_eq!(*converted.downcast::<Status>().unwrap(), Status::Closed);
        assert!(convert(&Value::from("pending")).is_none());
    }

    #[test]
    fn test_context_from_route_params() {
        let context = ResolveContext::from_params([("section", "orders"), ("num", "1")]);
        assert_eq!(context.get("section"), Some(&Value::from("orders")));
        assert!(context.contains("num"));
        assert!(!context.contains("page"));
        assert_eq!(context.len(), 2);
    }

    #[test]
    fn test_argument_accessors() {
        let mut arguments = Arguments::new();
        arguments.push("name", Value::from("Alex"));
        arguments.push("page", Value::from("2"));
        arguments.push("price", Value::Float(12.3));

        assert_eq!(arguments.string("name").unwrap(), "Alex");
        assert_eq!(arguments.int("page").unwrap(), 2);
        assert_eq!(arguments.float("price").unwrap(), 12.3);
        assert!(arguments.int("name").is_err());
        assert!(matches!(
            arguments.string("missing"),
            Err(CoreError::ParameterResolve { .. })
        ));
        assert_eq!(arguments.names().collect::<Vec<_>>(), vec!["name", "page", "price"]);
    }
}
