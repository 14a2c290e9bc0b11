//! Common imports for joke applications
//!
//! ```rust
//! use joke::prelude::*;
//! ```

pub use joke_core::{
    AppConfig, Arguments, ConfigManager, ConfigSection, CoreError, DependencyContainer, Injectable,
    ParamType, Parameter, ParameterResolver, ResolveContext, ServiceContainer, ServiceDefinition,
    ServiceRef, TryFromValue, Value,
};

pub use joke_http::{
    init_logging, middleware_service, Application, ExceptionMiddleware, Handler, HandlerOutput,
    HttpMethod, Invokable, JokeError, JokeRequest, JokeResponse, JokeResult, Json, LoggingConfig,
    LoggingMiddleware, Middleware, MiddlewareSource, Next, Responder, Route, Router, Server,
};

pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value as JsonValue};
pub use std::sync::Arc;
