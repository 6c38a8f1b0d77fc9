//! Providers: modules of related registrations.
//!
//! Providers group bindings, parameters, interface mappings and type
//! descriptors that belong together, so an application can assemble its
//! container from a few self-contained modules.
//!
//! # Examples
//! ```rust,ignore
//! struct NotificationProvider;
//!
//! impl Provider for NotificationProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) {
//!         registry.register_type(TypeDescriptor::interface::<dyn Transport>());
//!         registry.register_type(SmsTransport::descriptor());
//!         registry.bind("notifier".into(), Target::of::<Notifier>(), Parameters::new());
//!     }
//! }
//! ```

use serde_json::Value;

use crate::parameters::Parameters;
use crate::registry::Target;
use crate::types::TypeDescriptor;

/// A module that registers related services into a container.
pub trait Provider: Send + Sync {
    /// Register everything this module contributes.
    ///
    /// Called once, when the provider is added.
    fn register(&self, registry: &mut dyn ProviderRegistry);

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Interface that providers use to register.
///
/// This is the registration half of the container's API, so providers
/// can be tested against a mock.
pub trait ProviderRegistry {
    fn bind(&mut self, id: String, target: Target, options: Parameters);

    fn set_parameter(&mut self, id: String, value: Value);

    fn bind_interface(&mut self, interface: String, concrete: String, options: Parameters);

    fn register_type(&mut self, descriptor: TypeDescriptor);
}
