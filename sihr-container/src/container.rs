//! # Container
//!
//! Resolves identifiers and type names into fully constructed services,
//! auto-wiring constructor dependencies from the type registry and
//! caching results per identifier.
//!
//! # Resolution
//! ```text
//! get(id) ──cache hit──────────────────────────────────> Service
//!    │
//!    ├─ binding: factory ──> factory(resolver, params) ──┐
//!    ├─ binding: type ─────> instantiate(type, params) ──┤
//!    └─ registered type ───> instantiate(id, params) ────┴─> cache ──> Service
//!                               │
//!                               ├─ interface? ─> mapped type / single implementer
//!                               └─ per parameter:
//!                                    object ─> get(param name) if compatible, else get(type)
//!                                    scalar ─> params[param name]
//! ```
//!
//! # Examples
//! ```rust
//! use sihr_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Greeter {
//!     name: String,
//! }
//!
//! impl Greeter {
//!     fn greet(&self) -> String {
//!         format!("Hello {}", self.name)
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.register_type(
//!     TypeDescriptor::of::<Greeter>()
//!         .param("name")
//!         .constructor(|args| Ok(Greeter { name: args.param("name")? })),
//! );
//! container.set_parameter("name", "Anis");
//!
//! let greeter: Arc<Greeter> = container.resolve().expect("Failed to resolve");
//! assert_eq!(greeter.greet(), "Hello Anis");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, instrument, trace, warn};

use crate::arguments::Arguments;
use crate::error::{
    AmbiguousInterfaceError, CyclicDependencyError, NotFoundError, Result, SihrError,
};
use crate::graph::{DependencyInfo, GraphValidator};
use crate::parameters::Parameters;
use crate::provider::{Provider, ProviderRegistry};
use crate::registry::{Registry, Resolver, Target};
use crate::service::Service;
use crate::types::{Injectable, ParamKind, TypeDescriptor, TypeRegistry};

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// The service resolver.
///
/// Registration takes `&mut self`; resolution takes `&self`, so a fully
/// configured container can be shared between threads.
#[derive(Default)]
pub struct Container {
    registry: Registry,
    types: TypeRegistry,
    cache: DashMap<String, Service>,
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder {
            container: Container::new(),
        }
    }

    // ── Registration ──

    /// Binds `id` to a type name or a factory.
    pub fn bind(&mut self, id: impl Into<String>, target: impl Into<Target>) {
        self.bind_with(id, target, Parameters::new());
    }

    /// Binds `id` with per-binding options.
    ///
    /// Options override container parameters while resolving `id`, and
    /// may carry [`CACHEABLE`](crate::parameters::CACHEABLE).
    pub fn bind_with(&mut self, id: impl Into<String>, target: impl Into<Target>, options: Parameters) {
        self.registry.bind(id.into(), target.into(), options);
    }

    /// Sets a container-level scalar parameter.
    pub fn set_parameter(&mut self, id: impl Into<String>, value: impl Into<Value>) {
        self.registry.set_parameter(id.into(), value.into());
    }

    /// Sets every parameter in `parameters`, e.g. loaded from a config file.
    pub fn set_parameters(&mut self, parameters: Parameters) {
        for (id, value) in parameters {
            self.registry.set_parameter(id, value);
        }
    }

    /// Chooses the implementation used whenever `interface` is resolved.
    pub fn bind_interface(&mut self, interface: impl Into<String>, concrete: impl Into<String>) {
        self.bind_interface_with(interface, concrete, Parameters::new());
    }

    /// Like [`bind_interface`](Self::bind_interface), with options that
    /// fill in parameters the caller did not provide.
    pub fn bind_interface_with(
        &mut self,
        interface: impl Into<String>,
        concrete: impl Into<String>,
        options: Parameters,
    ) {
        self.registry
            .bind_interface(interface.into(), concrete.into(), options);
    }

    /// Registers a type descriptor for auto-wiring.
    pub fn register_type(&mut self, descriptor: TypeDescriptor) {
        self.types.register(descriptor);
    }

    /// Registers `T` using its own descriptor.
    pub fn register<T: Injectable>(&mut self) {
        self.types.register(T::descriptor());
    }

    /// Add a [`Provider`] module.
    pub fn add_provider(&mut self, provider: &dyn Provider) {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(self);
    }

    // ── Resolution ──

    /// Returns `true` if `id` is bound or names a registered type.
    pub fn has(&self, id: &str) -> bool {
        self.registry.binding(id).is_some() || self.types.contains(id)
    }

    /// Resolves `id`.
    ///
    /// # Errors
    /// - [`SihrError::NotFound`] if `id` is neither bound nor a registered type
    /// - [`SihrError::NotInstantiable`], [`SihrError::AmbiguousInterface`],
    ///   [`SihrError::UnresolvedParameter`] or [`SihrError::CyclicDependency`]
    ///   from anywhere in the dependency tree
    pub fn get(&self, id: &str) -> Result<Service> {
        trace!(id, "Resolving");
        Resolution::new(self).resolve(id)
    }

    /// Resolves `id` and downcasts it to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        self.get(id)?.typed::<T>(id)
    }

    /// Resolves the type `T` by the name it was registered under.
    ///
    /// ```rust,ignore
    /// let notifier: Arc<Notifier> = container.resolve()?;
    /// ```
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get_as::<T>(&self.types.name_of::<T>())
    }

    /// Registered type descriptors.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    // ── Validation ──

    /// Checks the declared wiring without constructing anything.
    ///
    /// Object parameters are followed with the same precedence as
    /// resolution: a binding named after the parameter first, then the
    /// declared type, with interfaces narrowed through mappings or a
    /// single implementer. Factories are opaque.
    ///
    /// # Errors
    /// - [`SihrError::NotFound`]: a binding, mapping or parameter names an
    ///   unregistered type
    /// - [`SihrError::AmbiguousInterface`] / [`SihrError::NotInstantiable`]:
    ///   an interface in use cannot be narrowed
    /// - [`SihrError::CyclicDependency`]: constructors depend on each other
    #[instrument(skip(self), name = "container_validate")]
    pub fn validate(&self) -> Result<()> {
        for (id, binding) in self.registry.bindings() {
            if let Target::Type(type_name) = &binding.target {
                if !self.types.contains(type_name) {
                    return Err(self.not_found(type_name, Some(id.to_string())));
                }
            }
        }

        for (interface, mapping) in self.registry.interfaces() {
            if !self.types.contains(&mapping.concrete) {
                return Err(self.not_found(&mapping.concrete, Some(interface.to_string())));
            }
        }

        let mut graph = HashMap::new();
        for descriptor in self.types.iter() {
            let dependencies = if descriptor.is_instantiable() {
                self.declared_dependencies(descriptor)?
            } else {
                Vec::new()
            };
            graph.insert(
                descriptor.name().to_string(),
                DependencyInfo {
                    key: descriptor.name().to_string(),
                    dependencies,
                },
            );
        }

        GraphValidator::new(graph).validate()
    }

    /// Concrete types a constructor will pull in, as far as registrations
    /// tell.
    fn declared_dependencies(&self, descriptor: &TypeDescriptor) -> Result<Vec<String>> {
        let mut dependencies = Vec::new();
        for param in descriptor.params() {
            let ParamKind::Service { declared } = param.kind() else {
                continue;
            };

            if self.has(param.name()) {
                match self.static_target(param.name())? {
                    None => continue,
                    Some(concrete) if self.types.is_compatible(&concrete, declared) => {
                        dependencies.push(concrete);
                        continue;
                    }
                    Some(_) => {}
                }
            }

            dependencies.extend(self.static_target(declared)?);
        }
        Ok(dependencies)
    }

    /// The type `id` would instantiate, or `None` when a factory decides.
    fn static_target(&self, id: &str) -> Result<Option<String>> {
        match self.registry.binding(id).map(|binding| &binding.target) {
            Some(Target::Factory(_)) => Ok(None),
            Some(Target::Type(bound)) => self.concrete_name(bound).map(Some),
            None => self.concrete_name(id).map(Some),
        }
    }

    /// Narrows an interface name to the type that would be built for it.
    fn concrete_name(&self, type_name: &str) -> Result<String> {
        match self.types.get(type_name) {
            Some(descriptor) if descriptor.is_interface() => {
                let (concrete, _) = self.implementation_of(descriptor.name())?;
                Ok(concrete.name().to_string())
            }
            _ => Ok(type_name.to_string()),
        }
    }

    // ── Internal ──

    /// Picks the implementation of `interface` and the options that come
    /// with an explicit mapping.
    fn implementation_of(&self, interface: &str) -> Result<(&TypeDescriptor, Option<&Parameters>)> {
        if let Some(mapping) = self.registry.interface(interface) {
            let concrete = self
                .types
                .get(&mapping.concrete)
                .ok_or_else(|| self.not_found(&mapping.concrete, Some(interface.to_string())))?;
            return Ok((concrete, Some(&mapping.options)));
        }

        match self.types.implementers(interface).as_slice() {
            [single] => Ok((*single, None)),
            [] => Err(SihrError::NotInstantiable {
                type_name: interface.to_string(),
                reason: "it is an interface and no registered type implements it".to_string(),
            }),
            candidates => Err(SihrError::AmbiguousInterface(AmbiguousInterfaceError {
                interface: interface.to_string(),
                candidates: candidates.iter().map(|d| d.name().to_string()).collect(),
            })),
        }
    }

    fn not_found(&self, id: &str, required_by: Option<String>) -> SihrError {
        let known: Vec<&str> = self
            .registry
            .registered_ids()
            .chain(self.types.names())
            .collect();

        SihrError::NotFound(NotFoundError {
            id: id.to_string(),
            required_by,
            suggestions: sihr_support::rendering::suggest_similar(id, &known, 3),
        })
    }
}

impl Resolver for Container {
    fn get(&self, id: &str) -> Result<Service> {
        Container::get(self, id)
    }

    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }
}

impl ProviderRegistry for Container {
    fn bind(&mut self, id: String, target: Target, options: Parameters) {
        self.registry.bind(id, target, options);
    }

    fn set_parameter(&mut self, id: String, value: Value) {
        self.registry.set_parameter(id, value);
    }

    fn bind_interface(&mut self, interface: String, concrete: String, options: Parameters) {
        self.registry.bind_interface(interface, concrete, options);
    }

    fn register_type(&mut self, descriptor: TypeDescriptor) {
        self.types.register(descriptor);
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.len())
            .field("parameters", &self.registry.parameters().len())
            .field("types", &self.types.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Resolution (internal bridge)
// ═══════════════════════════════════════════

/// One step of a resolution in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Id(String),
    Type(String),
}

impl Frame {
    fn name(&self) -> &str {
        match self {
            Frame::Id(name) | Frame::Type(name) => name,
        }
    }
}

/// State of one top-level `get()`, passed to factories as their resolver.
///
/// Keeps the path of ids and types being resolved so a cycle fails fast
/// instead of recursing without bound.
struct Resolution<'a> {
    container: &'a Container,
    path: Mutex<Vec<Frame>>,
}

impl<'a> Resolution<'a> {
    fn new(container: &'a Container) -> Self {
        Self {
            container,
            path: Mutex::new(Vec::new()),
        }
    }

    fn resolve(&self, id: &str) -> Result<Service> {
        let container = self.container;

        if let Some(cached) = container.cache.get(id) {
            trace!(id, "Serving cached instance");
            return Ok(cached.value().clone());
        }

        let (service, scope) = self.within(Frame::Id(id.to_string()), || {
            if let Some(binding) = container.registry.binding(id) {
                let params = container.registry.parameters().overridden_by(&binding.options);
                let service = match &binding.target {
                    Target::Factory(factory) => {
                        trace!(id, "Invoking factory");
                        let resolver: &dyn Resolver = self;
                        factory(resolver, &params)?
                    }
                    Target::Type(type_name) => self.instantiate(type_name, &params)?,
                };
                Ok((service, params.scope()))
            } else if container.types.contains(id) {
                let params = container.registry.parameters();
                Ok((self.instantiate(id, params)?, params.scope()))
            } else {
                Err(container.not_found(id, self.requester()))
            }
        })?;

        if !scope.is_cached() {
            debug!(id, scope = %scope, "Resolved without caching");
            return Ok(service);
        }

        debug!(id, scope = %scope, type_name = service.type_name(), "Resolved");
        Ok(container
            .cache
            .entry(id.to_string())
            .or_insert(service)
            .value()
            .clone())
    }

    fn instantiate(&self, type_name: &str, params: &Parameters) -> Result<Service> {
        let container = self.container;
        let requested = container
            .types
            .get(type_name)
            .ok_or_else(|| container.not_found(type_name, self.requester()))?;

        let (descriptor, params) = if requested.is_interface() {
            let (concrete, options) = container.implementation_of(requested.name())?;
            debug!(
                interface = requested.name(),
                implementation = concrete.name(),
                "Narrowed interface"
            );
            let params = match options {
                Some(options) => options.overridden_by(params),
                None => params.clone(),
            };
            (concrete, params)
        } else {
            (requested, params.clone())
        };

        if !descriptor.is_instantiable() {
            let reason = if descriptor.is_interface() {
                "it is an interface"
            } else {
                "it has no constructor"
            };
            return Err(SihrError::NotInstantiable {
                type_name: descriptor.name().to_string(),
                reason: reason.to_string(),
            });
        }

        self.within(Frame::Type(descriptor.name().to_string()), || {
            let args = self.arguments(descriptor, &params)?;
            debug!(type_name = descriptor.name(), arguments = args.len(), "Instantiating");
            descriptor.construct(&args).unwrap_or_else(|| {
                Err(SihrError::NotInstantiable {
                    type_name: descriptor.name().to_string(),
                    reason: "it has no constructor".to_string(),
                })
            })
        })
    }

    fn arguments(&self, descriptor: &'a TypeDescriptor, params: &Parameters) -> Result<Arguments<'a>> {
        let container = self.container;
        let mut args = Arguments::new(descriptor.name(), &container.types);

        for param in descriptor.params() {
            match param.kind() {
                ParamKind::Service { declared } => {
                    let service = self.dependency(param.name(), declared)?;
                    args.push_service(param.name(), declared, service);
                }
                ParamKind::Scalar { optional } => match params.get(param.name()) {
                    Some(value) => args.push_scalar(param.name(), value.clone()),
                    None if *optional => {
                        trace!(parameter = param.name(), "Omitted optional parameter");
                    }
                    None => {
                        return Err(SihrError::UnresolvedParameter {
                            parameter: param.name().to_string(),
                            owner: descriptor.name().to_string(),
                        });
                    }
                },
            }
        }

        Ok(args)
    }

    /// Resolves an object parameter: by parameter name when that yields a
    /// compatible service, otherwise by declared type.
    fn dependency(&self, name: &str, declared: &str) -> Result<Service> {
        let container = self.container;

        if container.has(name) {
            let candidate = self.resolve(name)?;
            if container.types.is_compatible(candidate.type_name(), declared) {
                trace!(parameter = name, "Injecting service bound to parameter name");
                return Ok(candidate);
            }
            debug!(
                parameter = name,
                declared,
                found = candidate.type_name(),
                "Service bound to parameter name has another type, resolving by type"
            );
        }

        self.resolve(declared)
    }

    /// Runs `step` with `frame` pushed on the path.
    fn within<R>(&self, frame: Frame, step: impl FnOnce() -> Result<R>) -> Result<R> {
        {
            let mut path = self.path.lock();
            if let Some(start) = path.iter().position(|f| *f == frame) {
                let mut chain: Vec<String> =
                    path[start..].iter().map(|f| f.name().to_string()).collect();
                chain.push(frame.name().to_string());
                chain.dedup();

                warn!(cycle = ?chain, "Circular dependency detected!");
                return Err(SihrError::CyclicDependency(CyclicDependencyError { chain }));
            }
            path.push(frame);
        }

        let result = step();
        self.path.lock().pop();
        result
    }

    /// The type currently being constructed, if any.
    fn requester(&self) -> Option<String> {
        self.path.lock().iter().rev().find_map(|frame| match frame {
            Frame::Type(name) => Some(name.clone()),
            Frame::Id(_) => None,
        })
    }
}

impl Resolver for Resolution<'_> {
    fn get(&self, id: &str) -> Result<Service> {
        self.resolve(id)
    }

    fn has(&self, id: &str) -> bool {
        self.container.has(id)
    }
}

// ═══════════════════════════════════════════
// ContainerBuilder
// ═══════════════════════════════════════════

/// Builds a validated [`Container`].
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .register::<SmsTransport>()
///     .register::<Notifier>()
///     .register_type(TypeDescriptor::interface::<dyn Transport>())
///     .parameter("receiver", "r@x.tld")
///     .bind("notifier", Target::of::<Notifier>())
///     .build()?;
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    pub fn bind(mut self, id: impl Into<String>, target: impl Into<Target>) -> Self {
        self.container.bind(id, target);
        self
    }

    pub fn bind_with(
        mut self,
        id: impl Into<String>,
        target: impl Into<Target>,
        options: Parameters,
    ) -> Self {
        self.container.bind_with(id, target, options);
        self
    }

    pub fn parameter(mut self, id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.container.set_parameter(id, value);
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.container.set_parameters(parameters);
        self
    }

    pub fn bind_interface(mut self, interface: impl Into<String>, concrete: impl Into<String>) -> Self {
        self.container.bind_interface(interface, concrete);
        self
    }

    pub fn bind_interface_with(
        mut self,
        interface: impl Into<String>,
        concrete: impl Into<String>,
        options: Parameters,
    ) -> Self {
        self.container.bind_interface_with(interface, concrete, options);
        self
    }

    pub fn register<T: Injectable>(mut self) -> Self {
        self.container.register::<T>();
        self
    }

    pub fn register_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.container.register_type(descriptor);
        self
    }

    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        self.container.add_provider(provider);
        self
    }

    /// Build the container, validating the dependency graph.
    ///
    /// See [`Container::validate`] for what is checked.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(
            bindings = self.container.registry.len(),
            types = self.container.types.len(),
            "Building container"
        );

        self.container.validate()?;

        info!("Container built successfully ✓");
        Ok(self.container)
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("container", &self.container)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::arguments::Arguments;
    pub use crate::error::{Result, SihrError};
    pub use crate::key::type_key;
    pub use crate::parameters::{CACHEABLE, Parameters};
    pub use crate::provider::{Provider, ProviderRegistry};
    pub use crate::registry::{Resolver, Target};
    pub use crate::scope::Scope;
    pub use crate::service::Service;
    pub use crate::types::{Injectable, TypeDescriptor};
}
