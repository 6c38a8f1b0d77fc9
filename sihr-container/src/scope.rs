//! Resolution lifecycle.
//!
//! The lifecycle of a resolved service is carried in its parameter set
//! under the [`CACHEABLE`](crate::parameters::CACHEABLE) key; [`Scope`]
//! is the typed view of that flag:
//! - [`Scope::Singleton`]: resolved once per identifier, then cached
//! - [`Scope::Transient`]: resolved fresh on every `get()`

use std::fmt;

/// Defines how long a resolved service lives within the container.
///
/// # Examples
/// ```
/// use sihr_container::{Parameters, Scope};
///
/// let options = Parameters::new().with_scope(Scope::Transient);
/// assert_eq!(options.scope(), Scope::Transient);
/// assert_eq!(Parameters::new().scope(), Scope::Singleton);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// One instance per identifier for the lifetime of the container.
    ///
    /// Created on first resolve and returned on every later `get()`.
    /// This is the default.
    #[default]
    Singleton,

    /// Built again on every `get()`, never cached.
    ///
    /// Suits objects whose mutable state must stay private to one caller.
    Transient,
}

impl Scope {
    /// Whether a resolution in this scope is stored in the cache.
    pub fn is_cached(&self) -> bool {
        *self == Scope::Singleton
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Singleton => "singleton",
            Scope::Transient => "transient",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scope_is_singleton() {
        assert_eq!(Scope::default(), Scope::Singleton);
    }

    #[test]
    fn only_singletons_are_cached() {
        assert!(Scope::Singleton.is_cached());
        assert!(!Scope::Transient.is_cached());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Scope::Singleton.to_string(), "singleton");
        assert_eq!(Scope::Transient.to_string(), "transient");
    }
}
