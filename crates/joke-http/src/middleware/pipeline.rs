//! Middleware chain execution

use std::sync::Arc;

use joke_core::ServiceContainer;

use super::{MiddlewareEntry, Next, NextFn};
use crate::errors::JokeResult;
use crate::request::JokeRequest;
use crate::response::JokeResponse;
use crate::routing::service_context;

/// A middleware chain around a core handler
#[derive(Debug)]
pub struct Pipeline {
    /// Entries in run order, as returned by `get_array_for_run`
    entries: Vec<MiddlewareEntry>,
    container: Arc<ServiceContainer>,
}

impl Pipeline {
    pub fn new(entries: Vec<MiddlewareEntry>, container: Arc<ServiceContainer>) -> Self {
        Self { entries, container }
    }

    /// Run the request through the middleware, then `core`.
    ///
    /// The entries are folded from the innermost outwards, so the first
    /// registered middleware ends up outermost.
    pub fn execute<F>(self, request: JokeRequest, core: F) -> JokeResult<JokeResponse>
    where
        F: FnOnce(JokeRequest) -> JokeResult<JokeResponse> + Send + 'static,
    {
        let mut chain: NextFn = Box::new(core);

        for entry in self.entries {
            let container = Arc::clone(&self.container);
            let next_handler = chain;
            chain = Box::new(move |request: JokeRequest| {
                let resolver = container.get_parameter_resolver();
                let middleware =
                    entry
                        .source
                        .resolve(&container, &resolver, &service_context(&request))?;
                middleware.handle(request, Next { handler: next_handler })
            });
        }

        chain(request)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::errors::JokeError;
    use crate::middleware::{Middleware, MiddlewareCollection};
    use crate::request::HttpMethod;

    #[derive(Debug)]
    struct Trace {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Trace {
        fn handle(&self, request: JokeRequest, next: Next) -> JokeResult<JokeResponse> {
            self.log.lock().unwrap().push(format!("before {}", self.label));
            let response = next.run(request);
            self.log.lock().unwrap().push(format!("after {}", self.label));
            response
        }
    }

    #[derive(Debug)]
    struct Deny;

    impl Middleware for Deny {
        fn handle(&self, _request: JokeRequest, _next: Next) -> JokeResult<JokeResponse> {
            Err(JokeError::forbidden("denied"))
        }
    }

    #[test]
    fn test_registration_order_is_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut collection = MiddlewareCollection::new();
        for label in ["one", "two"] {
            collection.add_middleware(
                Trace {
                    label,
                    log: Arc::clone(&log),
                },
                None,
                &[],
            );
        }

        let core_log = Arc::clone(&log);
        let none: [&str; 0] = [];
        let pipeline = Pipeline::new(collection.get_array_for_run(&none), ServiceContainer::new());
        let response = pipeline
            .execute(JokeRequest::new(HttpMethod::Get, "/"), move |_| {
                core_log.lock().unwrap().push("core".to_string());
                Ok(JokeResponse::html("done"))
            })
            .unwrap();

        assert_eq!(response.text().as_deref(), Some("done"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before one", "before two", "core", "after two", "after one"]
        );
    }

    #[test]
    fn test_short_circuit_skips_inner_chain() {
        let mut collection = MiddlewareCollection::new();
        collection.add_middleware(Deny, None, &[]);

        let none: [&str; 0] = [];
        let pipeline = Pipeline::new(collection.get_array_for_run(&none), ServiceContainer::new());
        let error = pipeline
            .execute(JokeRequest::new(HttpMethod::Get, "/"), |_| {
                panic!("core must not run")
            })
            .unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
