//! Derive macros for Sihr.
//!
//! See [`Injectable`] for the field mapping.

pub use sihr_macros::Injectable;
