//! Route registration and lookup

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use joke_core::ParameterResolver;

use super::handler::Handler;
use super::route::Route;
use crate::errors::{JokeError, JokeResult};
use crate::request::{HttpMethod, JokeRequest};
use crate::response::HandlerOutput;

#[derive(Debug, Default)]
struct RouterState {
    routes: HashMap<HttpMethod, Vec<Arc<Route>>>,
    named: HashMap<String, Arc<Route>>,
    /// Groups applied to every route registered while set
    auto_groups: BTreeSet<String>,
}

/// Route table indexed by method, plus a name index
#[derive(Debug)]
pub struct Router {
    state: RwLock<RouterState>,
    resolver: ParameterResolver,
}

impl Router {
    pub fn new(resolver: ParameterResolver) -> Self {
        Self {
            state: RwLock::new(RouterState::default()),
            resolver,
        }
    }

    pub fn get(&self, path: &str, handler: Handler, name: Option<&str>) -> JokeResult<Arc<Route>> {
        self.match_methods(&[HttpMethod::Get], path, handler, name)
    }

    pub fn post(&self, path: &str, handler: Handler, name: Option<&str>) -> JokeResult<Arc<Route>> {
        self.match_methods(&[HttpMethod::Post], path, handler, name)
    }

    pub fn put(&self, path: &str, handler: Handler, name: Option<&str>) -> JokeResult<Arc<Route>> {
        self.match_methods(&[HttpMethod::Put], path, handler, name)
    }

    pub fn delete(&self, path: &str, handler: Handler, name: Option<&str>) -> JokeResult<Arc<Route>> {
        self.match_methods(&[HttpMethod::Delete], path, handler, name)
    }

    pub fn patch(&self, path: &str, handler: Handler, name: Option<&str>) -> JokeResult<Arc<Route>> {
        self.match_methods(&[HttpMethod::Patch], path, handler, name)
    }

    pub fn head(&self, path: &str, handler: Handler, name: Option<&str>) -> JokeResult<Arc<Route>> {
        self.match_methods(&[HttpMethod::Head], path, handler, name)
    }

    /// Register under all six methods
    pub fn any(&self, path: &str, handler: Handler, name: Option<&str>) -> JokeResult<Arc<Route>> {
        self.match_methods(&HttpMethod::ALL, path, handler, name)
    }

    /// Register one route under several methods. The first method is the
    /// route's canonical one; the default name is `get#post|/path`.
    pub fn match_methods(
        &self,
        methods: &[HttpMethod],
        path: &str,
        handler: Handler,
        name: Option<&str>,
    ) -> JokeResult<Arc<Route>> {
        let mut unique: Vec<HttpMethod> = Vec::with_capacity(methods.len());
        for method in methods {
            if !unique.contains(method) {
                unique.push(*method);
            }
        }
        let methods = unique;
        let Some(&canonical) = methods.first() else {
            return Err(JokeError::internal(format!(
                "Route '{}' needs at least one method",
                path
            )));
        };

        let name = match name {
            Some(name) => name.to_string(),
            None => default_route_name(&methods, path),
        };

        let mut state = self.write_state();
        if state.named.contains_key(&name) {
            return Err(JokeError::duplicate_route(name));
        }

        let route = Arc::new(Route::new(canonical, path, handler, name.clone())?);
        if !state.auto_groups.is_empty() {
            route.merge_groups(state.auto_groups.iter().cloned());
        }

        for method in &methods {
            state
                .routes
                .entry(*method)
                .or_default()
                .push(Arc::clone(&route));
        }
        state.named.insert(name, Arc::clone(&route));

        tracing::debug!(route = %route.name(), path, "Registered route");
        Ok(route)
    }

    /// First route matching the request, bound to the request's method.
    /// Route parameters are stored on the request.
    pub fn find_route(&self, request: &mut JokeRequest) -> Option<Arc<Route>> {
        let method = request.method();
        let candidates = self
            .read_state()
            .routes
            .get(&method)
            .cloned()
            .unwrap_or_default();

        let route = candidates.into_iter().find(|route| route.matches(request))?;
        if route.method() == method {
            Some(route)
        } else {
            Some(Arc::new(route.with_method(method)))
        }
    }

    /// Find the route for the request and run it
    pub fn dispatch(&self, mut request: JokeRequest) -> JokeResult<HandlerOutput> {
        let route = self
            .find_route(&mut request)
            .ok_or_else(JokeError::route_not_found)?;
        route.run(&request, &self.resolver)
    }

    /// Route by name
    pub fn route(&self, name: &str) -> Option<Arc<Route>> {
        self.read_state().named.get(name).cloned()
    }

    /// Routes registered for a method, in registration order
    pub fn routes(&self, method: HttpMethod) -> Vec<Arc<Route>> {
        self.read_state()
            .routes
            .get(&method)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_auto_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_state()
            .auto_groups
            .extend(groups.into_iter().map(Into::into));
    }

    pub fn clean_auto_groups(&self) {
        self.write_state().auto_groups.clear();
    }

    pub fn auto_groups(&self) -> BTreeSet<String> {
        self.read_state().auto_groups.clone()
    }

    pub fn resolver(&self) -> &ParameterResolver {
        &self.resolver
    }

    pub fn len(&self) -> usize {
        self.read_state().named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, RouterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RouterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn default_route_name(methods: &[HttpMethod], path: &str) -> String {
    let methods: Vec<&str> = methods.iter().map(HttpMethod::as_lower).collect();
    format!("{}|{}", methods.join("#"), path)
}
