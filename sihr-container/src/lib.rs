//! Core container implementation for Sihr.
//!
//! Types describe themselves through a [`TypeDescriptor`]; the
//! [`Container`] then wires their constructors from bindings, parameters
//! and interface mappings.

pub mod arguments;
pub mod container;
pub mod error;
mod graph;
pub mod key;
pub mod parameters;
pub mod provider;
pub mod registry;
pub mod scope;
pub mod service;
pub mod types;

pub use arguments::Arguments;
pub use container::{Container, ContainerBuilder, prelude};
pub use error::{
    AmbiguousInterfaceError, CyclicDependencyError, NotFoundError, Result, SihrError,
};
pub use key::type_key;
pub use parameters::{CACHEABLE, Parameters};
pub use provider::{Provider, ProviderRegistry};
pub use registry::{FactoryFn, Resolver, Target};
pub use scope::Scope;
pub use service::Service;
pub use types::{
    ConstructorFn, Injectable, ParamDescriptor, ParamKind, TypeBuilder, TypeDescriptor,
    TypeRegistry,
};
