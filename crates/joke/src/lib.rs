//! # joke
//!
//! Umbrella package for the joke micro-framework: a service container with
//! parameter autowiring, pattern routes whose handlers receive resolved
//! arguments, and a `handle(request, next)` middleware pipeline.

pub use joke_core as core;
pub use joke_http as http;

pub use joke_core::{
    ApiError, ApiErrorResponse, AppConfig, ConfigManager, CoreError, Environment, ServiceContainer,
    ServiceScope,
};
pub use joke_http::{
    Application, Handler, HttpMethod, JokeError, JokeRequest as Request, JokeResponse as Response,
    JokeResult, Router, Server,
};

pub mod prelude;

/// Current version of joke
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}

pub fn name() -> &'static str {
    joke_core::FRAMEWORK_NAME
}
