//! Resolved services.
//!
//! A [`Service`] is whatever a resolution produced: a constructed type, an
//! interface handle or a plain value returned by a factory. It is
//! type-erased and shared; cloning a `Service` clones the handle, not the
//! value.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SihrError};
use crate::key::type_key;

/// A shared, type-erased resolved value.
#[derive(Clone)]
pub struct Service {
    value: Arc<dyn Any + Send + Sync>,
    type_name: Arc<str>,
}

impl Service {
    /// Wraps a value.
    ///
    /// ```
    /// use sihr_container::Service;
    ///
    /// let service = Service::new(String::from("hello"));
    /// assert_eq!(service.type_name(), "String");
    /// assert_eq!(*service.downcast::<String>().unwrap(), "hello");
    /// ```
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_key::<T>().into(),
        }
    }

    /// Wraps an interface handle.
    ///
    /// The service is named after the interface, so it satisfies any
    /// constructor parameter declared as `I`.
    pub fn interface<I: ?Sized + Send + Sync + 'static>(value: Arc<I>) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_key::<I>().into(),
        }
    }

    pub(crate) fn named(value: Arc<dyn Any + Send + Sync>, type_name: &str) -> Self {
        Self {
            value,
            type_name: type_name.into(),
        }
    }

    /// Name of the type held by this service.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the value as `Arc<T>` if it holds a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Returns `true` if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Service) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }

    pub(crate) fn erased(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.value)
    }

    /// Like [`downcast`](Self::downcast), reporting a mismatch against `id`.
    pub(crate) fn typed<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        self.downcast::<T>().ok_or_else(|| {
            let mut expected = type_key::<T>();
            if expected == self.type_name() {
                expected = std::any::type_name::<T>().to_string();
            }
            SihrError::TypeMismatch {
                id: id.to_string(),
                expected,
                found: self.type_name().to_string(),
            }
        })
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
