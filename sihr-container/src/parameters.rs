//! Scalar parameters and binding options.
//!
//! [`Parameters`] is used for both container-level parameters and
//! per-binding options. It is a plain JSON object, so it can be loaded
//! from any serde source:
//!
//! ```
//! use sihr_container::Parameters;
//!
//! let params: Parameters = serde_json::from_str(r#"{ "name": "Anis", "retries": 3 }"#).unwrap();
//! assert_eq!(params.value::<u32>("retries").unwrap(), 3);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SihrError};
use crate::scope::Scope;

/// Option key controlling whether a resolution is cached.
///
/// Only an explicit `false` disables caching.
pub const CACHEABLE: &str = "@cacheable";

/// A named set of scalar values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets the lifecycle flag, builder style.
    pub fn with_scope(self, scope: Scope) -> Self {
        self.with(CACHEABLE, scope.is_cached())
    }

    /// Inserts or overwrites a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Reads a value and deserializes it into `T`.
    ///
    /// Errors name the owner as "parameters"; use
    /// [`value_for`](Self::value_for) to name the consumer instead.
    ///
    /// # Errors
    /// - [`SihrError::UnresolvedParameter`] if `key` is absent
    /// - [`SihrError::InvalidParameter`] if it does not fit `T`
    pub fn value<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.value_for(key, "parameters")
    }

    /// Like [`value`](Self::value), reporting errors against `owner`,
    /// e.g. the id a factory is bound to.
    pub fn value_for<T: DeserializeOwned>(&self, key: &str, owner: &str) -> Result<T> {
        let value = self.get(key).ok_or_else(|| SihrError::UnresolvedParameter {
            parameter: key.to_string(),
            owner: owner.to_string(),
        })?;
        T::deserialize(value).map_err(|source| SihrError::InvalidParameter {
            parameter: key.to_string(),
            owner: owner.to_string(),
            source,
        })
    }

    /// Returns a copy of `self` with every entry of `overrides` applied on top.
    ///
    /// On key collision the value from `overrides` wins.
    pub fn overridden_by(&self, overrides: &Parameters) -> Parameters {
        let mut merged = self.clone();
        merged.extend(overrides.clone());
        merged
    }

    /// Lifecycle requested by this parameter set.
    pub fn scope(&self) -> Scope {
        match self.get(CACHEABLE) {
            Some(Value::Bool(false)) => Scope::Transient,
            _ => Scope::Singleton,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl Extend<(String, Value)> for Parameters {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.0.insert(key, value);
        }
    }
}

impl IntoIterator for Parameters {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
