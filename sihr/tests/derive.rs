//! Descriptors generated by `#[derive(Injectable)]`.

use std::sync::Arc;

use serde_json::Value;
use sihr::{Container, Injectable, ParamKind, Parameters, SihrError, TypeDescriptor};

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

trait Named: Send + Sync {
    fn label(&self) -> String;
}

#[derive(Injectable)]
#[inject(implements = "dyn Clock", implements = "dyn Named")]
struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        42
    }
}

impl Named for FixedClock {
    fn label(&self) -> String {
        "fixed".to_string()
    }
}

#[derive(Injectable)]
#[inject(name = "Scheduler")]
struct JobScheduler {
    clock: Arc<dyn Clock>,
    #[inject(name = "queue_name")]
    queue: String,
    #[inject(default)]
    workers: u32,
    label: Option<String>,
    #[inject(skip)]
    history: Vec<u64>,
}

trait Sink: Send + Sync {
    fn write(&self, line: &str) -> String;
}

#[derive(Injectable)]
#[inject(implements = "dyn Sink")]
struct ConsoleSink;

impl Sink for ConsoleSink {
    fn write(&self, line: &str) -> String {
        format!("console: {line}")
    }
}

#[derive(Injectable)]
struct AuditLog {
    sink: Arc<dyn Sink + Send + Sync>,
    plain: Arc<dyn Sink>,
}

fn kinds(descriptor: &TypeDescriptor) -> Vec<(&str, &ParamKind)> {
    descriptor
        .params()
        .iter()
        .map(|param| (param.name(), param.kind()))
        .collect()
}

#[test]
fn unit_struct_descriptor() {
    let descriptor = FixedClock::descriptor();

    assert_eq!(descriptor.name(), "FixedClock");
    assert!(descriptor.params().is_empty());
    assert!(descriptor.is_instantiable());
    assert_eq!(descriptor.interfaces().collect::<Vec<_>>(), ["Clock", "Named"]);
}

#[test]
fn field_descriptors_follow_declaration_order() {
    let descriptor = JobScheduler::descriptor();

    assert_eq!(descriptor.name(), "Scheduler");
    assert_eq!(
        kinds(&descriptor),
        [
            (
                "clock",
                &ParamKind::Service {
                    declared: "Clock".to_string()
                }
            ),
            ("queue_name", &ParamKind::Scalar { optional: false }),
            ("workers", &ParamKind::Scalar { optional: true }),
            ("label", &ParamKind::Scalar { optional: true }),
        ]
    );
}

fn scheduler_container() -> Container {
    let mut container = Container::new();
    container.register_type(TypeDescriptor::interface::<dyn Clock>());
    container.register_type(TypeDescriptor::interface::<dyn Named>());
    container.register::<FixedClock>();
    container.register::<JobScheduler>();
    container
}

#[test]
fn derived_constructor_applies_defaults() {
    let mut container = scheduler_container();
    container.set_parameter("queue_name", "emails");

    let scheduler = container.get_as::<JobScheduler>("Scheduler").unwrap();
    assert_eq!(scheduler.clock.now(), 42);
    assert_eq!(scheduler.queue, "emails");
    assert_eq!(scheduler.workers, 0);
    assert_eq!(scheduler.label, None);
    assert!(scheduler.history.is_empty());
}

#[test]
fn derived_constructor_reads_provided_values() {
    let mut container = scheduler_container();
    container.bind_with(
        "scheduler",
        "Scheduler",
        Parameters::new()
            .with("queue_name", "emails")
            .with("workers", 4)
            .with("label", "nightly"),
    );

    let scheduler = container.get_as::<JobScheduler>("scheduler").unwrap();
    assert_eq!(scheduler.workers, 4);
    assert_eq!(scheduler.label.as_deref(), Some("nightly"));
}

#[test]
fn derived_constructor_reports_missing_parameter() {
    let container = scheduler_container();

    match container.get("Scheduler").unwrap_err() {
        SihrError::UnresolvedParameter { parameter, owner } => {
            assert_eq!(parameter, "queue_name");
            assert_eq!(owner, "Scheduler");
        }
        other => panic!("Expected UnresolvedParameter, got: {other:?}"),
    }
}

#[test]
fn derived_constructor_reports_invalid_parameter() {
    let mut container = scheduler_container();
    container.set_parameter("queue_name", "emails");
    container.set_parameter("workers", "many");

    assert!(matches!(
        container.get("Scheduler"),
        Err(SihrError::InvalidParameter { .. })
    ));
}

#[test]
fn one_type_serves_several_interfaces() {
    let container = scheduler_container();

    let clock = container.get("Clock").unwrap();
    let named = container.get("Named").unwrap();
    assert_eq!(clock.type_name(), "FixedClock");
    assert_eq!(named.type_name(), "FixedClock");
    assert!(container.types().is_compatible("FixedClock", "Named"));

    let named = container
        .types()
        .upcast::<dyn Named>(&named, "Named")
        .unwrap();
    assert_eq!(named.label(), "fixed");
}

#[test]
fn null_parameters_read_as_absent() {
    let mut container = scheduler_container();
    container.set_parameter("queue_name", "emails");
    container.set_parameter("label", Value::Null);
    container.set_parameter("workers", Value::Null);

    let scheduler = container.get_as::<JobScheduler>("Scheduler").unwrap();
    assert_eq!(scheduler.label, None);
    assert_eq!(scheduler.workers, 0);
}

#[test]
fn bounded_trait_object_field_is_injected() {
    let mut container = Container::new();
    container.register_type(TypeDescriptor::interface::<dyn Sink>());
    container.register::<ConsoleSink>();
    container.register::<AuditLog>();

    let log = container.get_as::<AuditLog>("AuditLog").unwrap();
    assert_eq!(log.sink.write("login"), "console: login");
    assert_eq!(log.plain.write("logout"), "console: logout");
    assert_eq!(
        AuditLog::descriptor().params()[0].kind(),
        &ParamKind::Service {
            declared: "Sink".to_string()
        }
    );
}
