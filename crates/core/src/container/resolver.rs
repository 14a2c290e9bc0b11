//! Builds argument lists for constructors and handlers from a context map and
//! the container.

use std::any::type_name;
use std::collections::HashSet;
use std::sync::{Arc, Weak};

use crate::config::ConfigManager;
use crate::container::container::ServiceContainer;
use crate::container::definition::{Constructor, Injectable};
use crate::container::parameter::{Arguments, ParamType, Parameter, ResolveContext};
use crate::errors::CoreError;
use crate::value::{ServiceRef, Value};

/// Resolves declared parameters by name from a context, or by type from the
/// container that owns this resolver.
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    container: Weak<ServiceContainer>,
}

impl ParameterResolver {
    pub(crate) fn new(container: Weak<ServiceContainer>) -> Self {
        Self { container }
    }

    fn container(&self) -> Result<Arc<ServiceContainer>, CoreError> {
        self.container
            .upgrade()
            .ok_or_else(|| CoreError::parameter_resolve("service container is no longer available"))
    }

    /// Resolve the arguments of a callable, in declaration order
    pub fn resolve_for_callable(
        &self,
        parameters: &[Parameter],
        context: &ResolveContext,
    ) -> Result<Arguments, CoreError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = parameters.iter().find(|p| !seen.insert(p.name.as_str())) {
            return Err(CoreError::parameter_resolve(format!(
                "parameter '{}' is declared more than once",
                duplicate.name
            )));
        }

        if parameters.is_empty() {
            return Ok(Arguments::new());
        }

        let container = self.container()?;
        let mut arguments = Arguments::new();
        for parameter in parameters {
            let value = self.resolve_parameter(&container, parameter, context)?;
            arguments.push(parameter.name.clone(), value);
        }
        Ok(arguments)
    }

    /// Resolve the constructor arguments of an injectable type
    pub fn resolve_for_constructor<T: Injectable>(
        &self,
        context: &ResolveContext,
    ) -> Result<Arguments, CoreError> {
        self.resolve_for_callable(&T::parameters(), context)
    }

    /// Resolve the constructor arguments and build the value
    pub fn construct<T: Injectable>(&self, context: &ResolveContext) -> Result<T, CoreError> {
        let arguments = self.resolve_for_constructor::<T>(context)?;
        T::construct(&arguments)
    }

    /// Build a type-erased constructor with arguments from the context
    pub fn build(
        &self,
        constructor: &Constructor,
        context: &ResolveContext,
    ) -> Result<ServiceRef, CoreError> {
        let arguments = self.resolve_for_callable(&constructor.parameters(), context)?;
        tracing::trace!(class = constructor.type_name(), "constructing");
        constructor.build(&arguments)
    }

    fn resolve_parameter(
        &self,
        container: &ServiceContainer,
        parameter: &Parameter,
        context: &ResolveContext,
    ) -> Result<Value, CoreError> {
        if let Some(raw) = context.get(&parameter.name) {
            return from_context(parameter, raw);
        }

        match &parameter.ty {
            ParamType::Service(service) => {
                self.from_services(container, parameter, service, context)
            }
            ParamType::Convertible { type_name, .. } => {
                self.from_services(container, parameter, type_name, context)
            }
            ParamType::Config { type_name, load } => {
                if let Some(found) = lookup(container, type_name, context)? {
                    return Ok(Value::Object(found));
                }

                let manager = container
                    .lookup(type_name_of_manager())?
                    .and_then(|manager| manager.downcast::<ConfigManager>().ok());
                match manager {
                    Some(manager) => load(&manager).map(Value::Object).map_err(|error| {
                        CoreError::autowired_with_source(&parameter.name, *type_name, error)
                    }),
                    None => parameter
                        .default
                        .clone()
                        .ok_or_else(|| CoreError::autowired(&parameter.name, *type_name)),
                }
            }
            _ => parameter
                .default
                .clone()
                .ok_or_else(|| CoreError::autowired(&parameter.name, "scalar")),
        }
    }

    fn from_services(
        &self,
        container: &ServiceContainer,
        parameter: &Parameter,
        service: &str,
        context: &ResolveContext,
    ) -> Result<Value, CoreError> {
        match lookup(container, service, context)? {
            Some(found) => Ok(Value::Object(found)),
            None => parameter
                .default
                .clone()
                .ok_or_else(|| CoreError::autowired(&parameter.name, service)),
        }
    }
}

fn type_name_of_manager() -> &'static str {
    type_name::<ConfigManager>()
}

fn lookup(
    container: &ServiceContainer,
    service: &str,
    context: &ResolveContext,
) -> Result<Option<ServiceRef>, CoreError> {
    if let Some(found) = context.service(service) {
        return Ok(Some(Arc::clone(found)));
    }
    container.lookup(service)
}

fn from_context(parameter: &Parameter, raw: &Value) -> Result<Value, CoreError> {
    let name = &parameter.name;
    let cast_error = |target: &str| CoreError::autowired(name, format!("cannot cast {} to {target}", raw.kind()));

    match &parameter.ty {
        ParamType::Convertible { type_name, convert } => convert(raw)
            .ok_or_else(|| CoreError::autowired(name, format!("{type_name}::try_from({raw})"))),
        ParamType::Service(service) => Err(CoreError::autowired(
            name,
            format!("{service} has no tryFrom"),
        )),
        ParamType::Config { type_name, .. } => Err(CoreError::autowired(
            name,
            format!("{type_name} has no tryFrom"),
        )),
        ParamType::Int => raw.to_int().map(Value::Int).ok_or_else(|| cast_error("int")),
        ParamType::Float => raw.to_float().map(Value::Float).ok_or_else(|| cast_error("float")),
        ParamType::Bool => raw.to_bool().map(Value::Bool).ok_or_else(|| cast_error("bool")),
        ParamType::Str => raw
            .to_string_value()
            .map(Value::Str)
            .ok_or_else(|| cast_error("string")),
        ParamType::Mixed | ParamType::Union(_) | ParamType::Intersection(_) => Ok(raw.clone()),
    }
}
