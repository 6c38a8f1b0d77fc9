//! Type naming for the container.
//!
//! Types are looked up by string name, so every Rust type needs a stable,
//! human-readable key. [`type_key`] derives it from [`std::any::type_name`]:
//! the module path is dropped, and trait objects are keyed by the bare
//! trait name.
//!
//! Two types can share a key. The type registry tracks each type's
//! [`TypeId`](std::any::TypeId) and moves the later one to its full path.

use std::any::type_name;

use sihr_support::rendering::container_type_name;

/// Returns the name the container uses for `T`.
///
/// # Examples
/// ```
/// use sihr_container::key::type_key;
///
/// trait Mailer: Send + Sync {}
/// struct SmtpMailer;
///
/// assert_eq!(type_key::<SmtpMailer>(), "SmtpMailer");
/// assert_eq!(type_key::<dyn Mailer>(), "Mailer");
/// assert_eq!(type_key::<String>(), "String");
/// ```
#[inline]
pub fn type_key<T: ?Sized + 'static>() -> String {
    container_type_name(type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;
    trait Transport: Send + Sync {}

    #[test]
    fn key_of_struct() {
        assert_eq!(type_key::<Greeter>(), "Greeter");
    }

    #[test]
    fn key_of_trait_object() {
        assert_eq!(type_key::<dyn Transport>(), "Transport");
        assert_eq!(type_key::<dyn Transport + Send>(), "Transport");
    }

    #[test]
    fn key_of_generic_type() {
        assert_eq!(type_key::<Vec<Greeter>>(), "Vec<Greeter>");
    }

    #[test]
    fn distinct_types_distinct_keys() {
        assert_ne!(type_key::<Greeter>(), type_key::<dyn Transport>());
    }
}
