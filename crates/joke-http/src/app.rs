//! The application kernel: container, router and global middleware

use std::any::type_name;
use std::sync::{Arc, PoisonError, RwLock};

use joke_core::{AppConfig, ConfigManager, ServiceContainer, ServiceDefinition, ServiceRef};

use crate::errors::{JokeError, JokeResult};
use crate::middleware::{ExceptionMiddleware, MiddlewareCollection, MiddlewareSource, Pipeline};
use crate::request::JokeRequest;
use crate::response::{HandlerOutput, JokeResponse};
use crate::routing::Router;

/// Name of the default error-converting middleware
pub const EXCEPTION_MIDDLEWARE: &str = "exception";

type CoreFn = Box<dyn FnOnce(JokeRequest) -> JokeResult<JokeResponse> + Send>;

/// A configured application.
///
/// Boot registers the router, the application config and the config
/// manager in the container, and installs [`ExceptionMiddleware`] as the
/// outermost global middleware under the name `exception`.
#[derive(Debug)]
pub struct Application {
    container: Arc<ServiceContainer>,
    router: Arc<Router>,
    middlewares: RwLock<MiddlewareCollection>,
    config: Arc<AppConfig>,
}

impl Application {
    pub fn new() -> Self {
        Self::with_config(AppConfig::new(), ConfigManager::new())
    }

    /// Application configured from `JOKE_*` environment variables
    pub fn from_env() -> JokeResult<Self> {
        Ok(Self::with_config(AppConfig::from_env()?, ConfigManager::new()))
    }

    pub fn with_config(config: AppConfig, manager: ConfigManager) -> Self {
        let container = ServiceContainer::new();
        let router = Arc::new(Router::new(container.get_parameter_resolver()));
        let config = Arc::new(config);

        let shared_router: ServiceRef = Arc::clone(&router) as ServiceRef;
        container.register_singleton(type_name::<Router>(), ServiceDefinition::shared(shared_router));
        let shared_config: ServiceRef = Arc::clone(&config) as ServiceRef;
        container.register_singleton(type_name::<AppConfig>(), ServiceDefinition::shared(shared_config));
        container.singleton(manager);

        let mut middlewares = MiddlewareCollection::new();
        middlewares.add_middleware(
            MiddlewareSource::class::<ExceptionMiddleware>(),
            Some(EXCEPTION_MIDDLEWARE),
            &[],
        );

        tracing::debug!(
            environment = ?config.environment,
            debug = config.debug,
            "Application booted"
        );

        Self {
            container,
            router,
            middlewares: RwLock::new(middlewares),
            config,
        }
    }

    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Add a global middleware; a known name replaces the entry in place
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

    pub fn remove_middleware(&self, name: &str) -> bool {
        self.middlewares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn middlewares(&self) -> MiddlewareCollection {
        self.middlewares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load a route file; every route it registers joins `groups`
    pub fn load_routes<F>(&self, groups: &[&str], routes: F) -> JokeResult<()>
    where
        F: FnOnce(&Router) -> JokeResult<()>,
    {
        self.router.add_auto_groups(groups.iter().copied());
        let result = routes(&self.router);
        self.router.clean_auto_groups();
        result
    }

    /// Handle a request through the global and route middleware.
    ///
    /// A request matching no route still passes the global middleware, with
    /// a core that fails with "Route not found".
    pub fn handle(&self, mut request: JokeRequest) -> JokeResponse {
        let global = self.middlewares();

        let (entries, core): (_, CoreFn) = match self.router.find_route(&mut request) {
            Some(route) => {
                let groups: Vec<String> = route.groups().into_iter().collect();
                let entries = global
                    .with_middlewares(&route.middlewares())
                    .get_array_for_run(&groups);
                let resolver = self.container.get_parameter_resolver();
                let core: CoreFn = Box::new(move |request: JokeRequest| {
                    route
                        .run(&request, &resolver)
                        .map(HandlerOutput::into_response)
                });
                (entries, core)
            }
            None => {
                tracing::debug!(method = %request.method(), path = %request.path(), "No route matched");
                let none: [&str; 0] = [];
                let core: CoreFn = Box::new(|_| Err(JokeError::route_not_found()));
                (global.get_array_for_run(&none), core)
            }
        };

        match Pipeline::new(entries, Arc::clone(&self.container)).execute(request, core) {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(error = %error, "Unhandled error outside the exception middleware");
                error.into_error_response(self.config.debug)
            }
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
