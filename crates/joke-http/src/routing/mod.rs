//! Routing: patterns, handlers, routes and the router

pub mod handler;
pub mod pattern;
pub mod route;
pub mod router;
pub mod rules;

pub use handler::{Handler, Invokable};
pub use pattern::{PathSegment, RoutePattern, RoutePatternError};
pub use route::{request_context, service_context, Route};
pub use router::Router;
