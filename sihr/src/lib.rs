//! # Sihr: an auto-wiring service resolver for Rust
//!
//! Bind identifiers to types or factories, describe constructors once, and
//! let the container build the object graph on demand:
//!
//! ```rust
//! use std::sync::Arc;
//! use sihr::{Container, Injectable};
//!
//! trait Transport: Send + Sync {
//!     fn name(&self) -> String;
//! }
//!
//! #[derive(Injectable)]
//! #[inject(implements = "dyn Transport")]
//! struct SmsTransport;
//!
//! impl Transport for SmsTransport {
//!     fn name(&self) -> String {
//!         "SMS".into()
//!     }
//! }
//!
//! #[derive(Injectable)]
//! struct Notifier {
//!     transport: Arc<dyn Transport>,
//!     receiver: String,
//! }
//!
//! let container = Container::builder()
//!     .register_type(sihr::TypeDescriptor::interface::<dyn Transport>())
//!     .register::<SmsTransport>()
//!     .register::<Notifier>()
//!     .parameter("receiver", "r@x.tld")
//!     .build()?;
//!
//! let notifier: Arc<Notifier> = container.resolve()?;
//! assert_eq!(notifier.transport.name(), "SMS");
//! assert_eq!(notifier.receiver, "r@x.tld");
//! # Ok::<(), sihr::SihrError>(())
//! ```

pub use sihr_container::*;
pub use sihr_derive::*;
pub use sihr_support::*;
