//! Service registry: bindings, parameters and interface mappings.
//!
//! Pure data. Nothing here is validated; lookups that fail are reported
//! by the resolver when it actually needs the entry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::key::type_key;
use crate::parameters::Parameters;
use crate::service::Service;

/// A factory binding.
///
/// Receives the [`Resolver`] for its own dependencies and the merged
/// parameter set; whatever it returns is the service.
pub type FactoryFn = Arc<dyn Fn(&dyn Resolver, &Parameters) -> Result<Service> + Send + Sync>;

/// Lookup side of the container, as seen by factories.
///
/// Calls made through it join the resolution in progress, so cycles that
/// pass through a factory are still caught.
pub trait Resolver: Send + Sync {
    fn get(&self, id: &str) -> Result<Service>;

    fn has(&self, id: &str) -> bool;
}

impl dyn Resolver + '_ {
    /// Resolves `id` and downcasts it to `T`.
    ///
    /// ```rust,ignore
    /// Target::factory(|r, _| {
    ///     let greeter = r.get_as::<Greeter>("greeter")?;
    ///     Ok(Service::new(Mailer::new(greeter)))
    /// })
    /// ```
    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        self.get(id)?.typed::<T>(id)
    }
}

/// What an identifier is bound to.
#[derive(Clone)]
pub enum Target {
    /// Resolve by instantiating the named type.
    Type(String),
    /// Call the factory; its return value is the service.
    Factory(FactoryFn),
}

impl Target {
    /// Targets the type `T` by its container name.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Target::Type(type_key::<T>())
    }

    /// Targets a factory function.
    pub fn factory(
        factory: impl Fn(&dyn Resolver, &Parameters) -> Result<Service> + Send + Sync + 'static,
    ) -> Self {
        Target::Factory(Arc::new(factory))
    }
}

impl From<&str> for Target {
    fn from(type_name: &str) -> Self {
        Target::Type(type_name.to_string())
    }
}

impl From<String> for Target {
    fn from(type_name: String) -> Self {
        Target::Type(type_name)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Type(name) => f.debug_tuple("Type").field(name).finish(),
            Target::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Type(name) => write!(f, "{name}"),
            Target::Factory(_) => write!(f, "<factory>"),
        }
    }
}

/// Registration entry for a single identifier.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub target: Target,
    pub options: Parameters,
}

/// Explicit choice of implementation for an interface.
#[derive(Debug, Clone)]
pub(crate) struct InterfaceMapping {
    pub concrete: String,
    pub options: Parameters,
}

/// Stores all registrations of a container.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    bindings: HashMap<String, Binding>,
    parameters: Parameters,
    interfaces: HashMap<String, InterfaceMapping>,
}

impl Registry {
    /// Binds `id`, overwriting any previous binding.
    pub fn bind(&mut self, id: String, target: Target, options: Parameters) {
        debug!(id = %id, target = %target, options = options.len(), "Bound service");
        self.bindings.insert(id, Binding { target, options });
    }

    /// Sets a container-level parameter.
    pub fn set_parameter(&mut self, id: String, value: Value) {
        debug!(id = %id, "Set parameter");
        self.parameters.insert(id, value);
    }

    /// Maps `interface` to `concrete`: resolving the interface builds the
    /// concrete type instead.
    pub fn bind_interface(&mut self, interface: String, concrete: String, options: Parameters) {
        debug!(interface = %interface, concrete = %concrete, "Mapped interface");
        self.interfaces.insert(interface, InterfaceMapping { concrete, options });
    }

    pub fn binding(&self, id: &str) -> Option<&Binding> {
        self.bindings.get(id)
    }

    pub fn interface(&self, interface: &str) -> Option<&InterfaceMapping> {
        self.interfaces.get(interface)
    }

    /// Container-level parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(id, binding)| (id.as_str(), binding))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = (&str, &InterfaceMapping)> {
        self.interfaces.iter().map(|(name, mapping)| (name.as_str(), mapping))
    }

    /// Returns the number of bound identifiers.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Bound identifiers and mapped interfaces (for suggestions).
    pub fn registered_ids(&self) -> impl Iterator<Item = &str> {
        self.bindings
            .keys()
            .chain(self.interfaces.keys())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;

    #[test]
    fn bind_and_lookup() {
        let mut reg = Registry::default();
        reg.bind("db".into(), Target::of::<Database>(), Parameters::new());

        let binding = reg.binding("db").unwrap();
        assert!(matches!(&binding.target, Target::Type(name) if name == "Database"));
        assert!(reg.binding("cache").is_none());
    }

    #[test]
    fn rebinding_overwrites() {
        let mut reg = Registry::default();
        reg.bind("db".into(), "Database".into(), Parameters::new());
        reg.bind(
            "db".into(),
            Target::factory(|_, _| Ok(Service::new(Database))),
            Parameters::new().with("url", "postgres://localhost"),
        );

        assert_eq!(reg.len(), 1);
        let binding = reg.binding("db").unwrap();
        assert!(matches!(binding.target, Target::Factory(_)));
        assert!(binding.options.contains("url"));
    }

    #[test]
    fn last_interface_mapping_wins() {
        let mut reg = Registry::default();
        reg.bind_interface("Mailer".into(), "SmtpMailer".into(), Parameters::new());
        reg.bind_interface("Mailer".into(), "NullMailer".into(), Parameters::new());
        assert_eq!(reg.interface("Mailer").unwrap().concrete, "NullMailer");
    }

    #[test]
    fn parameters_overwrite() {
        let mut reg = Registry::default();
        reg.set_parameter("name".into(), "Anis".into());
        reg.set_parameter("name".into(), "Othman".into());
        assert_eq!(reg.parameters().value::<String>("name").unwrap(), "Othman");
    }

    #[test]
    fn target_display() {
        assert_eq!(Target::from("Greeter").to_string(), "Greeter");
        assert_eq!(Target::factory(|_, _| Ok(Service::new(1u8))).to_string(), "<factory>");
    }
}
