//! Notification example: auto-wiring, interface mappings and factories.
//!
//! Run with `RUST_LOG=sihr_container=debug` to watch the resolver work.

use std::sync::Arc;

use sihr::{CACHEABLE, Container, Injectable, Parameters, Result, Service, Target, TypeDescriptor};
use tracing_subscriber::EnvFilter;

// === Define your traits and types ===

trait Transport: Send + Sync {
    fn deliver(&self, receiver: &str, message: &str) -> String;
}

#[derive(Injectable)]
#[inject(implements = "dyn Transport")]
struct SmsTransport {
    #[inject(default)]
    sender: String,
}

impl Transport for SmsTransport {
    fn deliver(&self, receiver: &str, message: &str) -> String {
        format!("[SMS {}] {receiver}: {message}", self.sender)
    }
}

#[derive(Injectable)]
#[inject(implements = "dyn Transport")]
struct EmailTransport {
    smtp_host: String,
}

impl Transport for EmailTransport {
    fn deliver(&self, receiver: &str, message: &str) -> String {
        format!("[Email via {}] {receiver}: {message}", self.smtp_host)
    }
}

#[derive(Injectable)]
struct Notifier {
    transport: Arc<dyn Transport>,
    receiver: String,
}

impl Notifier {
    fn notify(&self, message: &str) -> String {
        self.transport.deliver(&self.receiver, message)
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sihr_container=info")),
        )
        .init();

    let container = Container::builder()
        .register_type(TypeDescriptor::interface::<dyn Transport>())
        .register::<SmsTransport>()
        .register::<EmailTransport>()
        .register::<Notifier>()
        // Two transports: pick one explicitly
        .bind_interface("Transport", "EmailTransport")
        .parameter("smtp_host", "mail.local")
        .parameter("receiver", "r@x.tld")
        // Same type, different options
        .bind_with(
            "ops_notifier",
            Target::of::<Notifier>(),
            Parameters::new().with("receiver", "ops@x.tld"),
        )
        // Factory returning plain data, rebuilt on every get
        .bind_with(
            "greeting",
            Target::factory(|resolver, params| {
                let notifier = resolver.get_as::<Notifier>("Notifier")?;
                let name: String = params.value_for("name", "greeting")?;
                Ok(Service::new(notifier.notify(&format!("Hello {name}"))))
            }),
            Parameters::new().with("name", "Anis").with(CACHEABLE, false),
        )
        .build()?;

    println!("✅ Container built successfully!");
    println!("{container:?}");

    let notifier: Arc<Notifier> = container.resolve()?;
    println!("📨 {}", notifier.notify("hi"));

    let ops = container.get_as::<Notifier>("ops_notifier")?;
    println!("📨 {}", ops.notify("disk almost full"));

    let greeting = container.get_as::<String>("greeting")?;
    println!("👋 {greeting}");

    println!("\n🎉 Everything works!");
    Ok(())
}
