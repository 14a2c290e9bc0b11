use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use joke_core::{ParameterResolver, ResolveContext};
use once_cell::sync::OnceCell;
use regex::Regex;

use super::handler::Handler;
use super::pattern::RoutePattern;
use crate::errors::{JokeError, JokeResult};
use crate::middleware::{MiddlewareCollection, MiddlewareSource};
use crate::request::{HttpMethod, JokeRequest};
use crate::response::HandlerOutput;

/// Resolution context for a request: its route parameters by name, and the
/// request itself as a request-scoped service.
pub fn request_context(request: &JokeRequest) -> ResolveContext {
    let mut context = ResolveContext::from_params(request.route_params());
    context.provide(Arc::new(request.clone()));
    context
}

/// Context holding only the request as a request-scoped service. Middleware
/// is built from this so its constructor names never meet route placeholders.
pub fn service_context(request: &JokeRequest) -> ResolveContext {
    let mut context = ResolveContext::new();
    context.provide(Arc::new(request.clone()));
    context
}

/// A registered route.
///
/// The path, handler, name and compiled pattern are fixed at registration;
/// middleware and groups may still be appended while routes are loaded.
#[derive(Debug)]
pub struct Route {
    method: HttpMethod,
    path: String,
    name: String,
    handler: Arc<Handler>,
    pattern: Arc<RoutePattern>,
    regex: Arc<OnceCell<Regex>>,
    groups: RwLock<BTreeSet<String>>,
    middlewares: RwLock<MiddlewareCollection>,
}

impl Route {
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        handler: Handler,
        name: impl Into<String>,
    ) -> JokeResult<Self> {
        let path = path.into();
        let pattern =
            RoutePattern::parse(&path).map_err(|e| JokeError::invalid_route(path.as_str(), e))?;

        Ok(Self {
            method,
            path,
            name: name.into(),
            handler: Arc::new(handler),
            pattern: Arc::new(pattern),
            regex: Arc::new(OnceCell::new()),
            groups: RwLock::new(BTreeSet::new()),
            middlewares: RwLock::new(MiddlewareCollection::new()),
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The compiled pattern, built on first use
    pub fn compile_pattern(&self) -> JokeResult<&Regex> {
        self.regex
            .get_or_try_init(|| self.pattern.compile())
            .map_err(|e| JokeError::invalid_route(self.path.as_str(), e))
    }

    /// Match the request path; on success the captures become the request's
    /// route parameters.
    pub fn matches(&self, request: &mut JokeRequest) -> bool {
        let regex = match self.compile_pattern() {
            Ok(regex) => regex,
            Err(error) => {
                tracing::error!(route = %self.name, error = %error, "Route pattern failed to compile");
                return false;
            }
        };

        let params: HashMap<String, String> = match regex.captures(request.path()) {
            Some(captures) => self
                .pattern
                .param_names
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
            None => return false,
        };

        request.set_route_params(params);
        true
    }

    /// Copy bound to another method, sharing everything else
    pub fn with_method(&self, method: HttpMethod) -> Route {
        Route {
            method,
            path: self.path.clone(),
            name: self.name.clone(),
            handler: Arc::clone(&self.handler),
            pattern: Arc::clone(&self.pattern),
            regex: Arc::clone(&self.regex),
            groups: RwLock::new(self.groups()),
            middlewares: RwLock::new(self.middlewares()),
        }
    }

    /// Invoke the handler with arguments resolved for this request
    pub fn run(
        &self,
        request: &JokeRequest,
        resolver: &ParameterResolver,
    ) -> JokeResult<HandlerOutput> {
        tracing::debug!(route = %self.name, handler = %self.handler.label(), "Running route");
        self.handler.invoke(resolver, &request_context(request))
    }

    pub fn add_middleware(
        &self,
        middleware: impl Into<MiddlewareSource>,
        name: Option<&str>,
        groups: &[&str],
    ) -> &Self {
        self.middlewares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_middleware(middleware, name, groups);
        self
    }

    pub fn add_group(&self, group: impl Into<String>) -> &Self {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(group.into());
        self
    }

    pub fn merge_groups<I, S>(&self, groups: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn groups(&self) -> BTreeSet<String> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the route's own middleware
    pub fn middlewares(&self) -> MiddlewareCollection {
        self.middlewares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
