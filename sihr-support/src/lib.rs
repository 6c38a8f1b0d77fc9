//! # Sihr Support
//!
//! Shared utilities for the Sihr resolver crates.
//!
//! This crate provides:
//! - Type naming as seen by the container
//! - Text rendering for error messages

pub mod rendering;
