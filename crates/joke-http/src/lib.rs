//! # joke-http
//!
//! Routing, middleware pipeline and HTTP glue for the joke micro-framework:
//! - Pattern routes with named rules, dispatched through the DI container
//! - `handle(request, next)` middleware with names and groups
//! - JSON error responses from a default exception middleware
//! - An axum host adapter

pub mod app;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod request;
pub mod response;
pub mod routing;
pub mod server;

pub use app::{Application, EXCEPTION_MIDDLEWARE};
pub use errors::{JokeError, JokeResult};
pub use logging::{init_logging, LoggingConfig};
pub use middleware::{
    middleware_service, ExceptionMiddleware, LoggingMiddleware, Middleware,
    MiddlewareCollection, MiddlewareEntry, MiddlewareSource, Next, Pipeline,
};
pub use request::{HttpMethod, JokeRequest};
pub use response::{HandlerOutput, JokeResponse, Json, Responder, ResponseBody};
pub use routing::{Handler, Invokable, Route, RoutePattern, Router};
pub use server::Server;
