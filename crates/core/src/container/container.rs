use std::any::type_name;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use once_cell::sync::OnceCell;

use crate::container::definition::{Injectable, ServiceDefinition, ServiceScope};
use crate::container::parameter::ResolveContext;
use crate::container::resolver::ParameterResolver;
use crate::errors::CoreError;
use crate::value::ServiceRef;

/// Object-safe view of a container, injectable into services that need to
/// look things up lazily.
pub trait DependencyContainer: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<ServiceRef>, CoreError>;

    fn has(&self, name: &str) -> bool;
}

/// Process-wide slot keys, so build tracking spans containers
static NEXT_SLOT_KEY: AtomicUsize = AtomicUsize::new(0);

/// One registration. The instance cell is only used for singletons.
struct ServiceSlot {
    key: usize,
    name: String,
    scope: ServiceScope,
    definition: ServiceDefinition,
    instance: OnceCell<ServiceRef>,
}

#[derive(Default)]
struct Registry {
    slots: Vec<Arc<ServiceSlot>>,
    singletons: HashMap<String, usize>,
    prototypes: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    /// Alias names already walked to a singleton slot
    resolved_aliases: HashMap<String, usize>,
}

impl Registry {
    fn table(&self, scope: ServiceScope) -> &HashMap<String, usize> {
        match scope {
            ServiceScope::Singleton => &self.singletons,
            ServiceScope::Prototype => &self.prototypes,
        }
    }

    /// Direct hit first, then the alias chain
    fn find(&self, name: &str, scope: ServiceScope) -> Result<Option<usize>, CoreError> {
        let table = self.table(scope);
        if let Some(&id) = table.get(name) {
            return Ok(Some(id));
        }
        if scope == ServiceScope::Singleton {
            if let Some(&id) = self.resolved_aliases.get(name) {
                return Ok(Some(id));
            }
        }

        let mut chain = vec![name];
        let mut visited = HashSet::from([name]);
        let mut current = name;
        while let Some(target) = self.aliases.get(current) {
            let target = target.as_str();
            chain.push(target);
            if !visited.insert(target) {
                return Err(CoreError::CircularAlias {
                    name: name.to_string(),
                    chain: chain.join(" -> "),
                });
            }
            if let Some(&id) = table.get(target) {
                return Ok(Some(id));
            }
            current = target;
        }
        Ok(None)
    }
}

thread_local! {
    static BUILDING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a slot as being built on the current thread
struct BuildGuard;

impl BuildGuard {
    fn enter(slot: &ServiceSlot) -> Result<Self, CoreError> {
        BUILDING.with(|building| {
            let mut building = building.borrow_mut();
            if building.iter().any(|(key, _)| *key == slot.key) {
                let path = building
                    .iter()
                    .map(|(_, name)| name.as_str())
                    .chain(std::iter::once(slot.name.as_str()))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(CoreError::CircularDependency {
                    path,
                    cycle_service: slot.name.clone(),
                });
            }
            building.push((slot.key, slot.name.clone()));
            Ok(BuildGuard)
        })
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILDING.with(|building| {
            building.borrow_mut().pop();
        });
    }
}

/// Dependency injection container with singleton and prototype
/// registrations and alias chains.
///
/// Always handled through an `Arc`; the container registers a resolver and
/// itself as services, both holding only weak references back to it.
pub struct ServiceContainer {
    registry: RwLock<Registry>,
    resolver: ParameterResolver,
    this: Weak<ServiceContainer>,
}

impl ServiceContainer {
    /// Create a container with the default services registered
    pub fn new() -> Arc<Self> {
        let container = Arc::new_cyclic(|this: &Weak<ServiceContainer>| Self {
            registry: RwLock::new(Registry::default()),
            resolver: ParameterResolver::new(this.clone()),
            this: this.clone(),
        });
        container.register_defaults();
        container
    }

    fn register_defaults(&self) {
        self.register_singleton(
            type_name::<ParameterResolver>(),
            ServiceDefinition::instance(self.resolver.clone()),
        );

        let this = self.this.clone();
        self.register(
            type_name::<ServiceContainer>(),
            ServiceDefinition::raw_factory(Vec::new(), move |_| {
                let container: ServiceRef = upgrade(&this)?;
                Ok(container)
            }),
        );

        let this = self.this.clone();
        self.register(
            type_name::<dyn DependencyContainer>(),
            ServiceDefinition::raw_factory(Vec::new(), move |_| {
                let container: Arc<dyn DependencyContainer> = upgrade(&this)?;
                let service: ServiceRef = Arc::new(container);
                Ok(service)
            }),
        );
    }

    /// Register a singleton. Instances are cached right away, factories and
    /// classes on first lookup.
    pub fn register_singleton(&self, name: impl Into<String>, definition: ServiceDefinition) {
        self.insert(name.into(), definition, ServiceScope::Singleton);
    }

    /// Register a prototype, rebuilt on every lookup. A plain instance has
    /// nothing to rebuild and is registered as a singleton instead.
    pub fn register(&self, name: impl Into<String>, definition: ServiceDefinition) {
        let scope = if definition.is_instance() {
            ServiceScope::Singleton
        } else {
            ServiceScope::Prototype
        };
        self.insert(name.into(), definition, scope);
    }

    pub fn register_alias(&self, alias: impl Into<String>, target: impl Into<String>) {
        let (alias, target) = (alias.into(), target.into());
        tracing::debug!(alias = %alias, target = %target, "registering alias");

        let mut registry = self.write_registry();
        registry.aliases.insert(alias, target);
        registry.resolved_aliases.clear();
    }

    fn insert(&self, name: String, definition: ServiceDefinition, scope: ServiceScope) {
        tracing::debug!(service = %name, kind = definition.kind(), scope = %scope, "registering service");

        let mut registry = self.write_registry();
        let id = registry.slots.len();
        let instance = match &definition {
            ServiceDefinition::Instance(value) if scope == ServiceScope::Singleton => {
                OnceCell::with_value(Arc::clone(value))
            }
            _ => OnceCell::new(),
        };
        registry.slots.push(Arc::new(ServiceSlot {
            key: NEXT_SLOT_KEY.fetch_add(1, Ordering::Relaxed),
            name: name.clone(),
            scope,
            definition,
            instance,
        }));

        match scope {
            ServiceScope::Singleton => {
                registry.prototypes.remove(&name);
                registry.singletons.insert(name, id);
            }
            ServiceScope::Prototype => {
                registry.singletons.remove(&name);
                registry.prototypes.insert(name, id);
            }
        }
        registry.resolved_aliases.clear();
    }

    /// Look up a service, building it if needed.
    ///
    /// Returns `Ok(None)` when nothing is registered under the name or any
    /// alias of it; use [`get_required`](Self::get_required) to fail instead.
    pub fn get(&self, name: &str) -> Result<Option<ServiceRef>, CoreError> {
        let service = self.lookup(name)?;
        if service.is_none() {
            tracing::debug!(service = name, "service not registered");
        }
        Ok(service)
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<Option<ServiceRef>, CoreError> {
        match self.find_slot(name)? {
            Some(slot) => self.instantiate(&slot).map(Some),
            None => Ok(None),
        }
    }

    fn find_slot(&self, name: &str) -> Result<Option<Arc<ServiceSlot>>, CoreError> {
        {
            let registry = self.read_registry();
            if let Some(id) = registry.find(name, ServiceScope::Singleton)? {
                let slot = Arc::clone(&registry.slots[id]);
                let memoise = !registry.singletons.contains_key(name)
                    && !registry.resolved_aliases.contains_key(name);
                drop(registry);
                if memoise {
                    self.write_registry()
                        .resolved_aliases
                        .insert(name.to_string(), id);
                }
                return Ok(Some(slot));
            }
            if let Some(id) = registry.find(name, ServiceScope::Prototype)? {
                return Ok(Some(Arc::clone(&registry.slots[id])));
            }
        }
        Ok(None)
    }

    fn instantiate(&self, slot: &ServiceSlot) -> Result<ServiceRef, CoreError> {
        match slot.scope {
            ServiceScope::Singleton => {
                if let Some(instance) = slot.instance.get() {
                    return Ok(Arc::clone(instance));
                }
                let _guard = BuildGuard::enter(slot)?;
                slot.instance
                    .get_or_try_init(|| self.build(slot))
                    .map(Arc::clone)
            }
            ServiceScope::Prototype => {
                let _guard = BuildGuard::enter(slot)?;
                self.build(slot)
            }
        }
    }

    fn build(&self, slot: &ServiceSlot) -> Result<ServiceRef, CoreError> {
        tracing::debug!(service = %slot.name, scope = %slot.scope, "building service");
        let context = ResolveContext::new();
        match &slot.definition {
            ServiceDefinition::Instance(value) => Ok(Arc::clone(value)),
            ServiceDefinition::Factory { parameters, build } => {
                let arguments = self.resolver.resolve_for_callable(parameters, &context)?;
                build(&arguments)
            }
            ServiceDefinition::Class(constructor) => self.resolver.build(constructor, &context),
        }
    }

    /// Check whether a service is registered, without building it
    pub fn has(&self, name: &str) -> bool {
        let registry = self.read_registry();
        [ServiceScope::Singleton, ServiceScope::Prototype]
            .into_iter()
            .any(|scope| matches!(registry.find(name, scope), Ok(Some(_))))
    }

    pub fn get_parameter_resolver(&self) -> ParameterResolver {
        self.resolver.clone()
    }

    /// Look up a service, failing when nothing is registered
    pub fn get_required(&self, name: &str) -> Result<ServiceRef, CoreError> {
        self.lookup(name)?
            .ok_or_else(|| CoreError::service_not_found(name))
    }

    /// Look up a service and downcast it
    pub fn get_typed<T: Send + Sync + 'static>(&self, name: &str) -> Result<Option<Arc<T>>, CoreError> {
        match self.get(name)? {
            Some(service) => service
                .downcast::<T>()
                .map(Some)
                .map_err(|_| CoreError::type_mismatch(name, type_name::<T>())),
            None => Ok(None),
        }
    }

    /// Resolve a service registered under its type name
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, CoreError> {
        let name = type_name::<T>();
        self.get_typed::<T>(name)?
            .ok_or_else(|| CoreError::service_not_found(name))
    }

    /// Resolve a trait-object service registered with [`singleton_as`](Self::singleton_as)
    pub fn resolve_as<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, CoreError> {
        let name = type_name::<T>();
        self.get_typed::<Arc<T>>(name)?
            .map(|inner| Arc::clone(&*inner))
            .ok_or_else(|| CoreError::service_not_found(name))
    }

    /// Register a ready value as a singleton under its type name
    pub fn singleton<T: Send + Sync + 'static>(&self, value: T) {
        self.register_singleton(type_name::<T>(), ServiceDefinition::instance(value));
    }

    /// Register a trait object as a singleton under the trait's type name
    pub fn singleton_as<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) {
        self.register_singleton(type_name::<T>(), ServiceDefinition::instance(value));
    }

    pub fn singleton_class<T: Injectable>(&self) {
        self.register_singleton(type_name::<T>(), ServiceDefinition::class::<T>());
    }

    pub fn prototype_class<T: Injectable>(&self) {
        self.register(type_name::<T>(), ServiceDefinition::class::<T>());
    }

    /// Number of names registered, aliases excluded
    pub fn len(&self) -> usize {
        let registry = self.read_registry();
        registry.singletons.len() + registry.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upgrade(this: &Weak<ServiceContainer>) -> Result<Arc<ServiceContainer>, CoreError> {
    this.upgrade()
        .ok_or_else(|| CoreError::service_not_found(type_name::<ServiceContainer>()))
}

impl DependencyContainer for ServiceContainer {
    fn get(&self, name: &str) -> Result<Option<ServiceRef>, CoreError> {
        ServiceContainer::get(self, name)
    }

    fn has(&self, name: &str) -> bool {
        ServiceContainer::has(self, name)
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.read_registry();
        f.debug_struct("ServiceContainer")
            .field("singletons", &registry.singletons.keys().collect::<Vec<_>>())
            .field("prototypes", &registry.prototypes.keys().collect::<Vec<_>>())
            .field("aliases", &registry.aliases)
            .finish()
    }
}
