//! Constructor arguments.
//!
//! The resolver collects one [`Arguments`] per instantiation and hands it
//! to the type's constructor, which reads each value back by parameter
//! name.

use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, SihrError};
use crate::key::type_key;
use crate::service::Service;
use crate::types::TypeRegistry;

#[derive(Debug)]
enum Argument {
    Service { declared: String, service: Service },
    Scalar(Value),
}

/// Resolved constructor arguments, in declaration order.
///
/// Optional scalars with no value are absent.
#[derive(Debug)]
pub struct Arguments<'a> {
    owner: String,
    types: &'a TypeRegistry,
    values: Vec<(String, Argument)>,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(owner: &str, types: &'a TypeRegistry) -> Self {
        Self {
            owner: owner.to_string(),
            types,
            values: Vec::new(),
        }
    }

    pub(crate) fn push_service(&mut self, name: &str, declared: &str, service: Service) {
        self.values.push((
            name.to_string(),
            Argument::Service {
                declared: declared.to_string(),
                service,
            },
        ));
    }

    pub(crate) fn push_scalar(&mut self, name: &str, value: Value) {
        self.values.push((name.to_string(), Argument::Scalar(value)));
    }

    /// The object-like argument `name` as a concrete `T`.
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let (_, service) = self.service_argument(name)?;
        service.typed::<T>(name)
    }

    /// The object-like argument `name` as the interface `I`.
    pub fn interface<I>(&self, name: &str) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let (declared, service) = self.service_argument(name)?;
        self.types
            .upcast::<I>(service, declared)
            .ok_or_else(|| SihrError::TypeMismatch {
                id: name.to_string(),
                expected: type_key::<I>(),
                found: service.type_name().to_string(),
            })
    }

    /// The scalar argument `name`, deserialized into `T`.
    pub fn param<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        match self.scalar(name)? {
            Some(value) => self.decode(name, value),
            None => Err(self.unresolved(name)),
        }
    }

    /// The scalar argument `name`, or `None` when it was omitted or null.
    pub fn optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.scalar(name)? {
            Some(value) => self.decode::<Option<T>>(name, value),
            None => Ok(None),
        }
    }

    /// Whether an argument named `name` was collected.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Name of the type being constructed.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn find(&self, name: &str) -> Option<&Argument> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, argument)| argument)
    }

    fn scalar(&self, name: &str) -> Result<Option<&Value>> {
        match self.find(name) {
            None => Ok(None),
            Some(Argument::Scalar(value)) => Ok(Some(value)),
            Some(Argument::Service { service, .. }) => Err(SihrError::TypeMismatch {
                id: name.to_string(),
                expected: "scalar parameter".to_string(),
                found: service.type_name().to_string(),
            }),
        }
    }

    fn decode<T: DeserializeOwned>(&self, name: &str, value: &Value) -> Result<T> {
        T::deserialize(value).map_err(|source| SihrError::InvalidParameter {
            parameter: name.to_string(),
            owner: self.owner.clone(),
            source,
        })
    }

    fn service_argument(&self, name: &str) -> Result<(&str, &Service)> {
        match self.find(name) {
            Some(Argument::Service { declared, service }) => Ok((declared.as_str(), service)),
            Some(Argument::Scalar(_)) => Err(SihrError::TypeMismatch {
                id: name.to_string(),
                expected: "service".to_string(),
                found: "scalar parameter".to_string(),
            }),
            None => Err(self.unresolved(name)),
        }
    }

    fn unresolved(&self, name: &str) -> SihrError {
        SihrError::UnresolvedParameter {
            parameter: name.to_string(),
            owner: self.owner.clone(),
        }
    }
}
