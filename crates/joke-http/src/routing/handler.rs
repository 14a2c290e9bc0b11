//! Route handlers
//!
//! A handler carries the parameter schema of its callable so the resolver can
//! build its arguments from route parameters, request-scoped services and the
//! container before invoking it.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use joke_core::{
    Arguments, Constructor, Injectable, Parameter, ParameterResolver, ResolveContext, ServiceRef,
};

use crate::errors::{JokeError, JokeResult};
use crate::response::{HandlerOutput, Responder};

type CallFn = Arc<dyn Fn(&Arguments) -> JokeResult<HandlerOutput> + Send + Sync>;
type BoundFn = Arc<dyn Fn(&ServiceRef, &Arguments) -> JokeResult<HandlerOutput> + Send + Sync>;

/// Controller callable as a whole, the counterpart of an `__invoke` method
pub trait Invokable: Injectable {
    /// Parameters of the call itself, separate from the constructor's
    fn signature() -> Vec<Parameter> {
        Vec::new()
    }

    fn invoke(&self, args: &Arguments) -> JokeResult<HandlerOutput>;
}

/// The callable behind a route
#[derive(Clone)]
pub enum Handler {
    /// Closure or plain function
    Function {
        label: String,
        parameters: Vec<Parameter>,
        call: CallFn,
    },
    /// Method bound to an existing shared object
    Method {
        target: ServiceRef,
        label: String,
        parameters: Vec<Parameter>,
        call: BoundFn,
    },
    /// Controller built per call, then its method invoked
    Controller {
        constructor: Constructor,
        method: String,
        parameters: Vec<Parameter>,
        call: BoundFn,
    },
}

impl Handler {
    pub fn function<F, R>(parameters: Vec<Parameter>, f: F) -> Self
    where
        F: Fn(&Arguments) -> R + Send + Sync + 'static,
        R: Responder,
    {
        Self::named("closure", parameters, f)
    }

    /// Function handler with a label shown in logs
    pub fn named<F, R>(label: impl Into<String>, parameters: Vec<Parameter>, f: F) -> Self
    where
        F: Fn(&Arguments) -> R + Send + Sync + 'static,
        R: Responder,
    {
        Handler::Function {
            label: label.into(),
            parameters,
            call: Arc::new(move |args| f(args).into_output()),
        }
    }

    pub fn method<T, F, R>(
        target: Arc<T>,
        method: &str,
        parameters: Vec<Parameter>,
        f: F,
    ) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &Arguments) -> R + Send + Sync + 'static,
        R: Responder,
    {
        let target: ServiceRef = target;
        Handler::Method {
            target,
            label: format!("{}::{}", type_name::<T>(), method),
            parameters,
            call: bind::<T, F, R>(f),
        }
    }

    /// Controller constructed through the container on every call
    pub fn controller<T, F, R>(method: &str, parameters: Vec<Parameter>, f: F) -> Self
    where
        T: Injectable,
        F: Fn(&T, &Arguments) -> R + Send + Sync + 'static,
        R: Responder,
    {
        Handler::Controller {
            constructor: Constructor::of::<T>(),
            method: method.to_string(),
            parameters,
            call: bind::<T, F, R>(f),
        }
    }

    pub fn invokable<T: Invokable>() -> Self {
        Handler::Controller {
            constructor: Constructor::of::<T>(),
            method: "__invoke".to_string(),
            parameters: T::signature(),
            call: bind::<T, _, _>(|controller: &T, args: &Arguments| controller.invoke(args)),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        match self {
            Handler::Function { parameters, .. }
            | Handler::Method { parameters, .. }
            | Handler::Controller { parameters, .. } => parameters,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Handler::Function { label, .. } | Handler::Method { label, .. } => label.clone(),
            Handler::Controller {
                constructor,
                method,
                ..
            } => format!("{}::{}", constructor.type_name(), method),
        }
    }

    /// Resolve the arguments and call the handler
    pub fn invoke(
        &self,
        resolver: &ParameterResolver,
        context: &ResolveContext,
    ) -> JokeResult<HandlerOutput> {
        match self {
            Handler::Function {
                parameters, call, ..
            } => {
                let args = resolver.resolve_for_callable(parameters, context)?;
                call(&args)
            }
            Handler::Method {
                target,
                parameters,
                call,
                ..
            } => {
                let args = resolver.resolve_for_callable(parameters, context)?;
                call(target, &args)
            }
            Handler::Controller {
                constructor,
                parameters,
                call,
                ..
            } => {
                let controller = resolver.build(constructor, context)?;
                let args = resolver.resolve_for_callable(parameters, context)?;
                call(&controller, &args)
            }
        }
    }
}

fn bind<T, F, R>(f: F) -> BoundFn
where
    T: Send + Sync + 'static,
    F: Fn(&T, &Arguments) -> R + Send + Sync + 'static,
    R: Responder,
{
    Arc::new(move |target: &ServiceRef, args: &Arguments| {
        let target = (**target).downcast_ref::<T>().ok_or_else(|| {
            JokeError::internal(format!("Handler target is not a {}", type_name::<T>()))
        })?;
        f(target, args).into_output()
    })
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Handler::Function { .. } => "Function",
            Handler::Method { .. } => "Method",
            Handler::Controller { .. } => "Controller",
        };
        f.debug_struct(kind)
            .field("label", &self.label())
            .field("parameters", &self.parameters())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joke_core::{CoreError, ServiceContainer};

    struct Greeter {
        greeting: String,
    }

    impl Greeter {
        fn greet(&self, args: &Arguments) -> JokeResult<String> {
            Ok(format!("{} {}", self.greeting, args.string("name")?))
        }
    }

    impl Injectable for Greeter {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::string("greeting").with_default("Hello")]
        }

        fn construct(args: &Arguments) -> Result<Self, CoreError> {
            Ok(Self {
                greeting: args.string("greeting")?,
            })
        }
    }

    struct Shout;

    impl Injectable for Shout {
        fn construct(_: &Arguments) -> Result<Self, CoreError> {
            Ok(Shout)
        }
    }

    impl Invokable for Shout {
        fn signature() -> Vec<Parameter> {
            vec![Parameter::string("word")]
        }

        fn invoke(&self, args: &Arguments) -> JokeResult<HandlerOutput> {
            Ok(HandlerOutput::Text(args.string("word")?.to_uppercase()))
        }
    }

    fn context() -> ResolveContext {
        ResolveContext::new().with("name", "Alex").with("word", "hey")
    }

    #[test]
    fn test_function_handler() {
        let container = ServiceContainer::new();
        let handler = Handler::function(vec![Parameter::string("name")], |args| {
            format!("Hi {}", args.string("name").unwrap_or_default())
        });

        let output = handler
            .invoke(&container.get_parameter_resolver(), &context())
            .unwrap();
        assert_eq!(output.as_text(), Some("Hi Alex"));
        assert_eq!(handler.label(), "closure");
    }

    #[test]
    fn test_method_handler_on_shared_target() {
        let container = ServiceContainer::new();
        let target = Arc::new(Greeter {
            greeting: "Hey".to_string(),
        });
        let handler = Handler::method(target, "greet", vec![Parameter::string("name")], Greeter::greet);

        let output = handler
            .invoke(&container.get_parameter_resolver(), &context())
            .unwrap();
        assert_eq!(output.as_text(), Some("Hey Alex"));
        assert!(handler.label().ends_with("Greeter::greet"));
    }

    #[test]
    fn test_controller_is_constructed_per_call() {
        let container = ServiceContainer::new();
        let handler =
            Handler::controller::<Greeter, _, _>("greet", vec![Parameter::string("name")], Greeter::greet);

        let output = handler
            .invoke(&container.get_parameter_resolver(), &context())
            .unwrap();
        assert_eq!(output.as_text(), Some("Hello Alex"));
    }

    #[test]
    fn test_invokable_controller() {
        let container = ServiceContainer::new();
        let handler = Handler::invokable::<Shout>();

        let output = handler
            .invoke(&container.get_parameter_resolver(), &context())
            .unwrap();
        assert_eq!(output.as_text(), Some("HEY"));
        assert!(handler.label().ends_with("Shout::__invoke"));
    }

    #[test]
    fn test_unresolvable_parameter_is_core_error() {
        let container = ServiceContainer::new();
        let handler = Handler::function(vec![Parameter::int("id")], |args| args.int("id").map(|id| id.to_string()));

        let error = handler
            .invoke(&container.get_parameter_resolver(), &ResolveContext::new())
            .unwrap_err();
        assert!(matches!(error, JokeError::Core(CoreError::Autowired { .. })));
    }
}
