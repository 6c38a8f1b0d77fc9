//! Type registry: what the container knows about constructible types.
//!
//! Rust has no runtime reflection, so every type the container may
//! auto-wire is described up front by a [`TypeDescriptor`]: whether it is
//! an interface, its constructor parameters in declaration order, the
//! interfaces it implements and how to construct it.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use sihr_container::{TypeDescriptor, TypeRegistry};
//!
//! trait Transport: Send + Sync {}
//! struct SmsTransport;
//! impl Transport for SmsTransport {}
//!
//! let mut types = TypeRegistry::new();
//! types.register(TypeDescriptor::interface::<dyn Transport>());
//! types.register(
//!     TypeDescriptor::of::<SmsTransport>()
//!         .implements::<dyn Transport>(|t| t as Arc<dyn Transport>)
//!         .constructor(|_| Ok(SmsTransport)),
//! );
//!
//! let implementers = types.implementers("Transport");
//! assert_eq!(implementers.len(), 1);
//! assert_eq!(implementers[0].name(), "SmsTransport");
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::arguments::Arguments;
use crate::error::Result;
use crate::key::type_key;
use crate::service::Service;

/// Constructs an instance from resolved arguments.
pub type ConstructorFn =
    Arc<dyn Fn(&Arguments<'_>) -> Result<Arc<dyn Any + Send + Sync>> + Send + Sync>;

/// Holds an [`Upcast<I>`] for some interface `I`.
///
/// One interface name may carry several casters, one per trait-object
/// flavour (`dyn I`, `dyn I + Send + Sync`, ...), since they share a key.
type Caster = Arc<dyn Any + Send + Sync>;

/// Converts an erased concrete instance into `Arc<I>`.
pub(crate) struct Upcast<I: ?Sized>(
    Box<dyn Fn(Arc<dyn Any + Send + Sync>) -> Option<Arc<I>> + Send + Sync>,
);

/// A type that can describe itself to the container.
///
/// Usually implemented with `#[derive(Injectable)]`.
pub trait Injectable: Any + Send + Sync {
    fn descriptor() -> TypeDescriptor;
}

/// How a constructor parameter is satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Object-like dependency, resolved as a service of the declared type.
    Service { declared: String },
    /// Scalar looked up by name in the parameter set.
    Scalar { optional: bool },
}

/// One constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    name: String,
    kind: ParamKind,
}

impl ParamDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeKind {
    Interface,
    Concrete,
}

/// Everything the container knows about one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    type_id: TypeId,
    rust_name: &'static str,
    kind: TypeKind,
    params: Vec<ParamDescriptor>,
    implements: BTreeMap<String, Vec<Caster>>,
    constructor: Option<ConstructorFn>,
}

impl TypeDescriptor {
    /// Starts describing the concrete type `T`.
    pub fn of<T: Any + Send + Sync>() -> TypeBuilder<T> {
        TypeBuilder {
            name: type_key::<T>(),
            type_id: TypeId::of::<T>(),
            rust_name: type_name::<T>(),
            params: Vec::new(),
            implements: BTreeMap::new(),
            _marker: PhantomData,
        }
    }

    /// Describes the interface `I`, usually a `dyn Trait`.
    pub fn interface<I: ?Sized + 'static>() -> TypeDescriptor {
        TypeDescriptor {
            name: type_key::<I>(),
            type_id: TypeId::of::<I>(),
            rust_name: type_name::<I>(),
            kind: TypeKind::Interface,
            params: Vec::new(),
            implements: BTreeMap::new(),
            constructor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified Rust name of the described type.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// A concrete type with a constructor.
    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Concrete && self.constructor.is_some()
    }

    /// Constructor parameters in declaration order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.implements.contains_key(interface)
    }

    /// Names of the implemented interfaces.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.implements.keys().map(String::as_str)
    }

    /// Runs the constructor.
    ///
    /// Callers check [`is_instantiable`](Self::is_instantiable) first.
    pub(crate) fn construct(&self, args: &Arguments<'_>) -> Option<Result<Service>> {
        let constructor = self.constructor.as_ref()?;
        Some(constructor(args).map(|value| Service::named(value, &self.name)))
    }

    fn casters(&self, interface: &str) -> &[Caster] {
        self.implements
            .get(interface)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("implements", &self.implements.keys().collect::<Vec<_>>())
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// Builder for the descriptor of a concrete type `T`.
///
/// Finish with [`constructor`](Self::constructor), or with
/// [`abstract_type`](Self::abstract_type) for a type that is known but
/// cannot be built.
pub struct TypeBuilder<T> {
    name: String,
    type_id: TypeId,
    rust_name: &'static str,
    params: Vec<ParamDescriptor>,
    implements: BTreeMap<String, Vec<Caster>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeBuilder<T> {
    /// Registers the type under `name` instead of its Rust name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds an object-like parameter declared as `D`.
    pub fn service<D: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.service_named(name, type_key::<D>())
    }

    /// Adds an object-like parameter declared by type name.
    pub fn service_named(mut self, name: impl Into<String>, declared: impl Into<String>) -> Self {
        self.params.push(ParamDescriptor {
            name: name.into(),
            kind: ParamKind::Service {
                declared: declared.into(),
            },
        });
        self
    }

    /// Adds a required scalar parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamDescriptor {
            name: name.into(),
            kind: ParamKind::Scalar { optional: false },
        });
        self
    }

    /// Adds a scalar parameter that has a default.
    pub fn optional_param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamDescriptor {
            name: name.into(),
            kind: ParamKind::Scalar { optional: true },
        });
        self
    }

    /// Declares that `T` implements the interface `I`.
    ///
    /// `cast` is the unsizing coercion, typically `|t| t as Arc<dyn I>`.
    ///
    /// `dyn I` and `dyn I + Send + Sync` are distinct Rust types under the
    /// same interface name; declare each flavour a constructor asks for.
    /// The derive macro does this for you.
    pub fn implements<I>(mut self, cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let upcast: Upcast<I> = Upcast(Box::new(move |value: Arc<dyn Any + Send + Sync>| {
            value.downcast::<T>().ok().map(&cast)
        }));
        let casters = self.implements.entry(type_key::<I>()).or_default();
        casters.retain(|caster| !caster.is::<Upcast<I>>());
        casters.push(Arc::new(upcast));
        self
    }

    /// Finishes the descriptor with the function that builds `T`.
    pub fn constructor(
        self,
        constructor: impl Fn(&Arguments<'_>) -> Result<T> + Send + Sync + 'static,
    ) -> TypeDescriptor {
        let constructor: ConstructorFn = Arc::new(move |args: &Arguments<'_>| {
            constructor(args).map(|value| Arc::new(value) as Arc<dyn Any + Send + Sync>)
        });
        self.finish(Some(constructor))
    }

    /// Finishes the descriptor without a constructor.
    ///
    /// The type can be named and can implement interfaces, but resolving it
    /// fails with `NotInstantiable`.
    pub fn abstract_type(self) -> TypeDescriptor {
        self.finish(None)
    }

    fn finish(self, constructor: Option<ConstructorFn>) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            type_id: self.type_id,
            rust_name: self.rust_name,
            kind: TypeKind::Concrete,
            params: self.params,
            implements: self.implements,
            constructor,
        }
    }
}

/// All registered type descriptors, keyed by type name.
///
/// Names are short (`Config`, not `app::billing::Config`), so each Rust
/// type also remembers the name it was registered under.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
    names: HashMap<TypeId, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, replacing any previous one for the same type.
    ///
    /// A different Rust type whose name is already taken is registered
    /// under its fully qualified path instead.
    pub fn register(&mut self, mut descriptor: TypeDescriptor) {
        if let Some(existing) = self.types.get(&descriptor.name) {
            if existing.type_id != descriptor.type_id {
                warn!(
                    type_name = %descriptor.name,
                    taken_by = existing.rust_name,
                    registered_as = descriptor.rust_name,
                    "Type name already taken, registering under the full path"
                );
                descriptor.name = descriptor.rust_name.to_string();
            }
        }

        debug!(
            type_name = %descriptor.name,
            interface = descriptor.is_interface(),
            params = descriptor.params.len(),
            "Registered type"
        );
        self.names.insert(descriptor.type_id, descriptor.name.clone());
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// The name `T` is registered under, or its [`type_key`] if it is not
    /// registered.
    pub fn name_of<T: ?Sized + 'static>(&self) -> String {
        self.names
            .get(&TypeId::of::<T>())
            .cloned()
            .unwrap_or_else(type_key::<T>)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Concrete types implementing `interface`, sorted by name.
    pub fn implementers(&self, interface: &str) -> Vec<&TypeDescriptor> {
        let mut found: Vec<&TypeDescriptor> = self
            .types
            .values()
            .filter(|d| !d.is_interface() && d.implements(interface))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Whether a service of type `actual` can stand in for `declared`.
    pub fn is_compatible(&self, actual: &str, declared: &str) -> bool {
        actual == declared || self.get(actual).is_some_and(|d| d.implements(declared))
    }

    /// Views `service` as the interface `I` registered under `declared`.
    ///
    /// Works for services stored as `Arc<I>` directly and for concrete
    /// types that registered an upcast for `declared`.
    pub fn upcast<I>(&self, service: &Service, declared: &str) -> Option<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        if let Some(handle) = service.downcast::<Arc<I>>() {
            return Some(Arc::clone(&handle));
        }
        let upcast = self
            .get(service.type_name())?
            .casters(declared)
            .iter()
            .find_map(|caster| caster.downcast_ref::<Upcast<I>>())?;
        (upcast.0)(service.erased())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Transport: Send + Sync {
        fn name(&self) -> String;
    }

    struct Sms;
    impl Transport for Sms {
        fn name(&self) -> String {
            "SMS".into()
        }
    }

    struct Email;
    impl Transport for Email {
        fn name(&self) -> String {
            "Email".into()
        }
    }

    struct Base;

    fn registry() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register(TypeDescriptor::interface::<dyn Transport>());
        types.register(
            TypeDescriptor::of::<Sms>()
                .implements::<dyn Transport>(|t| t as Arc<dyn Transport>)
                .constructor(|_| Ok(Sms)),
        );
        types.register(
            TypeDescriptor::of::<Email>()
                .implements::<dyn Transport>(|t| t as Arc<dyn Transport>)
                .constructor(|_| Ok(Email)),
        );
        types
    }

    #[test]
    fn builder_records_params_in_order() {
        let descriptor = TypeDescriptor::of::<Base>()
            .service::<dyn Transport>("transport")
            .param("receiver")
            .optional_param("subject")
            .abstract_type();

        let names: Vec<_> = descriptor.params().iter().map(ParamDescriptor::name).collect();
        assert_eq!(names, ["transport", "receiver", "subject"]);
        assert_eq!(
            descriptor.params()[0].kind(),
            &ParamKind::Service { declared: "Transport".into() }
        );
        assert_eq!(descriptor.params()[2].kind(), &ParamKind::Scalar { optional: true });
    }

    #[test]
    fn interfaces_and_abstract_types_are_not_instantiable() {
        assert!(!TypeDescriptor::interface::<dyn Transport>().is_instantiable());
        assert!(!TypeDescriptor::of::<Base>().abstract_type().is_instantiable());
        assert!(TypeDescriptor::of::<Base>().constructor(|_| Ok(Base)).is_instantiable());
    }

    #[test]
    fn named_overrides_type_name() {
        let descriptor = TypeDescriptor::of::<Base>().named("Simple").abstract_type();
        assert_eq!(descriptor.name(), "Simple");
    }

    #[test]
    fn implementers_sorted_by_name() {
        let types = registry();
        let names: Vec<_> = types.implementers("Transport").iter().map(|d| d.name()).collect();
        assert_eq!(names, ["Email", "Sms"]);
        assert!(types.implementers("Logger").is_empty());
    }

    #[test]
    fn compatibility_follows_implements() {
        let types = registry();
        assert!(types.is_compatible("Sms", "Sms"));
        assert!(types.is_compatible("Sms", "Transport"));
        assert!(!types.is_compatible("Sms", "Email"));
        assert!(!types.is_compatible("Unknown", "Transport"));
    }

    #[test]
    fn upcast_concrete_service() {
        let types = registry();
        let service = Service::new(Sms);
        let transport = types.upcast::<dyn Transport>(&service, "Transport").unwrap();
        assert_eq!(transport.name(), "SMS");
    }

    #[test]
    fn upcast_interface_handle() {
        let types = TypeRegistry::new();
        let service = Service::interface(Arc::new(Email) as Arc<dyn Transport>);
        let transport = types.upcast::<dyn Transport>(&service, "Transport").unwrap();
        assert_eq!(transport.name(), "Email");
    }

    #[test]
    fn upcast_without_registration_fails() {
        let types = TypeRegistry::new();
        assert!(types.upcast::<dyn Transport>(&Service::new(Sms), "Transport").is_none());
    }

    #[test]
    fn upcast_picks_matching_trait_object_flavour() {
        let mut types = TypeRegistry::new();
        types.register(
            TypeDescriptor::of::<Sms>()
                .implements::<dyn Transport>(|t| t as Arc<dyn Transport>)
                .implements::<dyn Transport + Send + Sync>(|t| t as Arc<dyn Transport + Send + Sync>)
                .constructor(|_| Ok(Sms)),
        );
        let service = Service::new(Sms);

        let plain = types.upcast::<dyn Transport>(&service, "Transport").unwrap();
        let bounded = types
            .upcast::<dyn Transport + Send + Sync>(&service, "Transport")
            .unwrap();
        assert_eq!(plain.name(), "SMS");
        assert_eq!(bounded.name(), "SMS");
        assert_eq!(types.get("Sms").unwrap().interfaces().collect::<Vec<_>>(), ["Transport"]);
    }

    #[test]
    fn repeated_implements_keeps_one_caster() {
        let descriptor = TypeDescriptor::of::<Sms>()
            .implements::<dyn Transport>(|t| t as Arc<dyn Transport>)
            .implements::<dyn Transport>(|t| t as Arc<dyn Transport>)
            .constructor(|_| Ok(Sms));
        assert_eq!(descriptor.casters("Transport").len(), 1);
    }

    mod billing {
        pub struct Config;
    }

    mod shipping {
        pub struct Config;
    }

    #[test]
    fn same_short_name_registers_under_full_path() {
        let mut types = TypeRegistry::new();
        types.register(TypeDescriptor::of::<billing::Config>().constructor(|_| Ok(billing::Config)));
        types.register(TypeDescriptor::of::<shipping::Config>().constructor(|_| Ok(shipping::Config)));

        assert_eq!(types.len(), 2);
        assert_eq!(types.name_of::<billing::Config>(), "Config");
        assert_eq!(
            types.name_of::<shipping::Config>(),
            std::any::type_name::<shipping::Config>()
        );
        assert_eq!(
            types.get("Config").unwrap().rust_name(),
            std::any::type_name::<billing::Config>()
        );
    }

    #[test]
    fn unregistered_type_falls_back_to_key() {
        assert_eq!(TypeRegistry::new().name_of::<Base>(), "Base");
    }

    #[test]
    fn register_replaces() {
        let mut types = TypeRegistry::new();
        types.register(TypeDescriptor::of::<Base>().abstract_type());
        types.register(TypeDescriptor::of::<Base>().constructor(|_| Ok(Base)));
        assert_eq!(types.len(), 1);
        assert!(types.get("Base").unwrap().is_instantiable());
    }
}
