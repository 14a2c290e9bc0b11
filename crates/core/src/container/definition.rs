use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::container::parameter::{Arguments, Parameter};
use crate::errors::CoreError;
use crate::value::ServiceRef;

/// Service lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceScope {
    /// Built once, then shared by every lookup
    #[default]
    Singleton,
    /// Built on every lookup
    Prototype,
}

impl ServiceScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceScope::Singleton => "singleton",
            ServiceScope::Prototype => "prototype",
        }
    }
}

impl fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for services that can be constructed by the container.
///
/// `parameters` declares the constructor signature; the resolver fills an
/// [`Arguments`] list from it and hands it to `construct`.
pub trait Injectable: Send + Sync + Sized + 'static {
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    fn construct(args: &Arguments) -> Result<Self, CoreError>;
}

pub type BuildFn = Arc<dyn Fn(&Arguments) -> Result<ServiceRef, CoreError> + Send + Sync>;

/// Type-erased constructor of an [`Injectable`] type
#[derive(Clone, Copy)]
pub struct Constructor {
    type_name: &'static str,
    parameters: fn() -> Vec<Parameter>,
    build: fn(&Arguments) -> Result<ServiceRef, CoreError>,
}

fn build_shared<T: Injectable>(args: &Arguments) -> Result<ServiceRef, CoreError> {
    Ok(Arc::new(T::construct(args)?))
}

impl Constructor {
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_name: type_name::<T>(),
            parameters: T::parameters,
            build: build_shared::<T>,
        }
    }

    /// Constructor with a custom build step, e.g. one that wraps the
    /// instance into a trait object before erasing it
    pub fn new(
        type_name: &'static str,
        parameters: fn() -> Vec<Parameter>,
        build: fn(&Arguments) -> Result<ServiceRef, CoreError>,
    ) -> Self {
        Self {
            type_name,
            parameters,
            build,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        (self.parameters)()
    }

    pub fn build(&self, args: &Arguments) -> Result<ServiceRef, CoreError> {
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// How a registered service is produced
#[derive(Clone)]
pub enum ServiceDefinition {
    /// A ready value
    Instance(ServiceRef),
    /// A callable with a declared parameter schema
    Factory {
        parameters: Vec<Parameter>,
        build: BuildFn,
    },
    /// A type constructed through its `Injectable` implementation
    Class(Constructor),
}

impl ServiceDefinition {
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        ServiceDefinition::Instance(Arc::new(value))
    }

    /// An already shared value
    pub fn shared(value: ServiceRef) -> Self {
        ServiceDefinition::Instance(value)
    }

    pub fn factory<T, F>(parameters: Vec<Parameter>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Self::raw_factory(parameters, move |args| {
            let service: ServiceRef = Arc::new(factory(args)?);
            Ok(service)
        })
    }

    /// A factory returning an already erased service
    pub fn raw_factory<F>(parameters: Vec<Parameter>, factory: F) -> Self
    where
        F: Fn(&Arguments) -> Result<ServiceRef, CoreError> + Send + Sync + 'static,
    {
        ServiceDefinition::Factory {
            parameters,
            build: Arc::new(factory),
        }
    }

    pub fn class<T: Injectable>() -> Self {
        ServiceDefinition::Class(Constructor::of::<T>())
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, ServiceDefinition::Instance(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServiceDefinition::Instance(_) => "instance",
            ServiceDefinition::Factory { .. } => "factory",
            ServiceDefinition::Class(_) => "class",
        }
    }
}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceDefinition::Instance(_) => f.write_str("Instance(..)"),
            ServiceDefinition::Factory { parameters, .. } => f
                .debug_struct("Factory")
                .field("parameters", parameters)
                .finish_non_exhaustive(),
            ServiceDefinition::Class(constructor) => {
                f.debug_tuple("Class").field(constructor).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    struct Greeter {
        greeting: String,
    }

    impl Injectable for Greeter {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::string("greeting")]
        }

        fn construct(args: &Arguments) -> Result<Self, CoreError> {
            Ok(Self {
                greeting: args.string("greeting")?,
            })
        }
    }

    #[test]
    fn test_constructor_builds_erased_instance() {
        let constructor = Constructor::of::<Greeter>();
        assert!(constructor.type_name().ends_with("Greeter"));
        assert_eq!(constructor.parameters().len(), 1);

        let mut args = Arguments::new();
        args.push("greeting", Value::from("Hi"));
        let service = constructor.build(&args).unwrap();
        let greeter = service.downcast::<Greeter>().ok().unwrap();
        assert_eq!(greeter.greeting, "Hi");
    }

    #[test]
    fn test_definition_kinds() {
        assert!(ServiceDefinition::instance(1_u8).is_instance());
        assert_eq!(
            ServiceDefinition::factory(Vec::new(), |_| Ok(String::new())).kind(),
            "factory"
        );
        assert_eq!(ServiceDefinition::class::<Greeter>().kind(), "class");
        assert_eq!(ServiceScope::default(), ServiceScope::Singleton);
    }
}
