#[allow(clippy::module_inception)]
pub mod container;
pub mod definition;
pub mod parameter;
pub mod resolver;

pub use container::{DependencyContainer, ServiceContainer};
pub use definition::{BuildFn, Constructor, Injectable, ServiceDefinition, ServiceScope};
pub use parameter::{Arguments, ParamType, Parameter, ResolveContext, TryFromValue};
pub use resolver::ParameterResolver;
