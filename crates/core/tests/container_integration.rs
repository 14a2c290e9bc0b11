//! Integration tests for the service container and parameter autowiring
//!
//! Exercises registration, alias chains, constructor injection through trait
//! objects and configuration sections, and concurrent singleton builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use joke_core::{
    AppConfig, Arguments, ConfigManager, Constructor, CoreError, Injectable, Parameter,
    ResolveContext, ServiceContainer, ServiceDefinition, Value,
};

/// Test service trait
trait EmailService: Send + Sync {
    fn provider(&self) -> &str;
}

struct SmtpEmailService;

impl EmailService for SmtpEmailService {
    fn provider(&self) -> &str {
        "smtp"
    }
}

/// Service with a trait-object dependency and a config section
struct Newsletter {
    mailer: Arc<dyn EmailService>,
    app: Arc<AppConfig>,
}

impl Injectable for Newsletter {
    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::service::<dyn EmailService>("mailer"),
            Parameter::config::<AppConfig>("app"),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self, CoreError> {
        Ok(Self {
            mailer: args.shared::<dyn EmailService>("mailer")?,
            app: args.service::<AppConfig>("app")?,
        })
    }
}

/// Controller-like type mixing context values and services
struct ReportController {
    newsletter: Arc<Newsletter>,
    year: i64,
}

impl Injectable for ReportController {
    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::service::<Newsletter>("newsletter"),
            Parameter::int("year"),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self, CoreError> {
        Ok(Self {
            newsletter: args.service::<Newsletter>("newsletter")?,
            year: args.int("year")?,
        })
    }
}

fn configured_container() -> Arc<ServiceContainer> {
    let container = ServiceContainer::new();
    container.singleton_as::<dyn EmailService>(Arc::new(SmtpEmailService));
    container.singleton(
        ConfigManager::from_json_str(r#"{"app": {"name": "mailing", "environment": "testing"}}"#)
            .unwrap(),
    );
    container.singleton_class::<Newsletter>();
    container
}

#[test]
fn test_constructor_injection_with_trait_object_and_config() {
    let container = configured_container();

    let newsletter = container.resolve::<Newsletter>().unwrap();
    assert_eq!(newsletter.mailer.provider(), "smtp");
    assert_eq!(newsletter.app.name, "mailing");
}

#[test]
fn test_resolver_constructs_with_context() {
    let container = configured_container();
    let resolver = container.get_parameter_resolver();

    let controller = resolver
        .construct::<ReportController>(&ResolveContext::new().with("year", "2024"))
        .unwrap();
    assert_eq!(controller.year, 2024);
    assert!(Arc::ptr_eq(
        &controller.newsletter,
        &container.resolve::<Newsletter>().unwrap()
    ));
}

#[test]
fn test_resolver_builds_erased_constructor() {
    let container = configured_container();
    let resolver = container.get_parameter_resolver();

    let built = resolver
        .build(
            &Constructor::of::<ReportController>(),
            &ResolveContext::new().with("year", 1999),
        )
        .unwrap();
    assert_eq!(Value::Object(built).downcast::<ReportController>().unwrap().year, 1999);
}

#[test]
fn test_alias_and_canonical_share_instance() {
    let container = configured_container();
    container.register_alias("newsletter", std::any::type_name::<Newsletter>());
    container.register_alias("mailing.newsletter", "newsletter");

    let by_alias = container.get("mailing.newsletter").unwrap().unwrap();
    let by_name = container.get(std::any::type_name::<Newsletter>()).unwrap().unwrap();
    assert!(Arc::ptr_eq(&by_alias, &by_name));

    // Lookup by alias first, then by the canonical name
    let fresh = configured_container();
    fresh.register_alias("newsletter", std::any::type_name::<Newsletter>());
    let first = fresh.get("newsletter").unwrap().unwrap();
    let second = fresh.get(std::any::type_name::<Newsletter>()).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_alias_to_prototype() {
    let container = ServiceContainer::new();
    container.register(
        "token",
        ServiceDefinition::factory(Vec::new(), |_| Ok(String::from("abc"))),
    );
    container.register_alias("csrf", "token");

    let first = container.get("csrf").unwrap().unwrap();
    let second = container.get("csrf").unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(container.has("csrf"));
}

#[test]
fn test_factory_parameters_are_autowired() {
    let container = configured_container();
    container.register_singleton(
        "greeting",
        ServiceDefinition::factory(vec![Parameter::config::<AppConfig>("app")], |args| {
            Ok(format!("Hello from {}", args.service::<AppConfig>("app")?.name))
        }),
    );

    let greeting = container.get_typed::<String>("greeting").unwrap().unwrap();
    assert_eq!(greeting.as_str(), "Hello from mailing");
}

#[test]
fn test_missing_config_section_reports_source() {
    let container = ServiceContainer::new();
    container.singleton_as::<dyn EmailService>(Arc::new(SmtpEmailService));
    container.singleton(ConfigManager::new());
    container.singleton_class::<Newsletter>();

    let error = container
        .resolve::<Newsletter>()
        .err()
        .expect("newsletter needs the app section");
    assert!(error.is_autowired());
    let source = std::error::Error::source(&error).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("Missing configuration section: app"));
}

#[test]
fn test_concurrent_singleton_built_once() {
    let container = ServiceContainer::new();
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    container.register_singleton(
        "slow",
        ServiceDefinition::factory(Vec::new(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(10));
            Ok(42_u32)
        }),
    );

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let container = Arc::clone(&container);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                container.get_typed::<u32>("slow").unwrap().unwrap()
            })
        })
        .collect();

    let instances: Vec<Arc<u32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}
