//! # Middleware
//!
//! Middleware follow the `handle(request, next)` pattern: each one receives
//! the request and the rest of the chain, and may short-circuit, call `next`
//! and post-process the response.

pub mod collection;
pub mod exception;
pub mod logging;
pub mod pipeline;

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use joke_core::{
    Arguments, Constructor, CoreError, Injectable, ParameterResolver, ResolveContext,
    ServiceContainer, ServiceDefinition, ServiceRef,
};

use crate::errors::{JokeError, JokeResult};
use crate::request::JokeRequest;
use crate::response::JokeResponse;

pub use collection::{MiddlewareCollection, MiddlewareEntry};
pub use exception::ExceptionMiddleware;
pub use logging::LoggingMiddleware;
pub use pipeline::Pipeline;

type NextFn = Box<dyn FnOnce(JokeRequest) -> JokeResult<JokeResponse> + Send>;

/// The rest of the middleware chain
pub struct Next {
    handler: NextFn,
}

impl Next {
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(JokeRequest) -> JokeResult<JokeResponse> + Send + 'static,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Run the rest of the chain with the given request
    pub fn run(self, request: JokeRequest) -> JokeResult<JokeResponse> {
        (self.handler)(request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next(..)")
    }
}

pub trait Middleware: Send + Sync + fmt::Debug {
    /// Handle the request and call the next middleware in the chain
    fn handle(&self, request: JokeRequest, next: Next) -> JokeResult<JokeResponse>;

    fn name(&self) -> &'static str {
        "Middleware"
    }
}

/// Where a middleware instance comes from when the chain runs
#[derive(Debug, Clone)]
pub enum MiddlewareSource {
    Instance(Arc<dyn Middleware>),
    /// Built through the resolver on every run
    Class(Constructor),
    /// Looked up in the container by name
    Service(String),
}

impl MiddlewareSource {
    pub fn instance<M: Middleware + 'static>(middleware: M) -> Self {
        MiddlewareSource::Instance(Arc::new(middleware))
    }

    pub fn class<M: Middleware + Injectable>() -> Self {
        MiddlewareSource::Class(Constructor::new(
            type_name::<M>(),
            M::parameters,
            build_middleware::<M>,
        ))
    }

    pub fn service(name: impl Into<String>) -> Self {
        MiddlewareSource::Service(name.into())
    }

    /// Name used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            MiddlewareSource::Instance(middleware) => middleware.name().to_string(),
            MiddlewareSource::Class(constructor) => constructor.type_name().to_string(),
            MiddlewareSource::Service(name) => name.clone(),
        }
    }

    /// Produce the middleware instance
    pub fn resolve(
        &self,
        container: &ServiceContainer,
        resolver: &ParameterResolver,
        context: &ResolveContext,
    ) -> JokeResult<Arc<dyn Middleware>> {
        match self {
            MiddlewareSource::Instance(middleware) => Ok(Arc::clone(middleware)),
            MiddlewareSource::Class(constructor) => {
                let built = resolver.build(constructor, context)?;
                as_middleware(built, constructor.type_name())
            }
            MiddlewareSource::Service(name) => {
                let service = container
                    .get(name)?
                    .ok_or_else(|| CoreError::service_not_found(name.as_str()))?;
                as_middleware(service, name)
            }
        }
    }
}

impl<M: Middleware + 'static> From<M> for MiddlewareSource {
    fn from(middleware: M) -> Self {
        MiddlewareSource::instance(middleware)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareSource {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        MiddlewareSource::Instance(middleware)
    }
}

/// Container definition exposing a middleware under a service name
pub fn middleware_service<M: Middleware + 'static>(middleware: M) -> ServiceDefinition {
    let middleware: Arc<dyn Middleware> = Arc::new(middleware);
    ServiceDefinition::instance(middleware)
}

fn build_middleware<M: Middleware + Injectable>(args: &Arguments) -> Result<ServiceRef, CoreError> {
    let middleware: Arc<dyn Middleware> = Arc::new(M::construct(args)?);
    Ok(Arc::new(middleware))
}

fn as_middleware(service: ServiceRef, name: &str) -> JokeResult<Arc<dyn Middleware>> {
    service
        .downcast::<Arc<dyn Middleware>>()
        .map(|inner| Arc::clone(&*inner))
        .map_err(|_| JokeError::wrong_middleware(name))
}
