//! Error types for Sihr resolution.
//!
//! Every failure names the identifier or type involved and, where it
//! can, what to do about it.

use std::fmt;

use sihr_support::rendering::render_chain;

/// Main error type for all Sihr operations.
#[derive(Debug, thiserror::Error)]
pub enum SihrError {
    /// Identifier has no binding and names no registered type.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// The resolved type cannot be constructed.
    #[error("Type {type_name} is not instantiable: {reason}")]
    NotInstantiable { type_name: String, reason: String },

    /// An interface has several implementers and no explicit mapping.
    #[error("{}", .0)]
    AmbiguousInterface(AmbiguousInterfaceError),

    /// A required scalar constructor parameter has no value.
    #[error("Cannot resolve parameter '{parameter}' of {owner}\n  Hint: provide it with .set_parameter() or as a binding option")]
    UnresolvedParameter { parameter: String, owner: String },

    /// Resolution re-entered something it was already resolving.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// A resolved service does not hold the requested Rust type.
    #[error("Type mismatch for '{id}': expected {expected}, found {found}")]
    TypeMismatch {
        id: String,
        expected: String,
        found: String,
    },

    /// A scalar parameter is present but does not deserialize into the
    /// type the constructor asked for.
    #[error("Invalid value for parameter '{parameter}' of {owner}: {source}")]
    InvalidParameter {
        parameter: String,
        owner: String,
        #[source]
        source: serde_json::Error,
    },

    /// A constructor or factory failed for its own reasons.
    #[error("Failed to construct {type_name}: {source}")]
    ConstructionFailed {
        type_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SihrError {
    /// Wraps an arbitrary error raised while building `type_name`.
    pub fn construction(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConstructionFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }
}

/// Error when an identifier cannot be resolved at all.
#[derive(Debug)]
pub struct NotFoundError {
    /// The identifier or type name that was requested
    pub id: String,
    /// The type being constructed when the lookup failed (if any)
    pub required_by: Option<String>,
    /// Known identifiers that look close to the requested one
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' was not found as service id or type name", self.id)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: bind it with .bind(\"{}\", ...) or register its type with .register_type()",
            self.id
        )
    }
}

/// Error when an interface cannot be narrowed to a single implementation.
#[derive(Debug)]
pub struct AmbiguousInterfaceError {
    pub interface: String,
    /// Every registered type implementing the interface, sorted by name
    pub candidates: Vec<String>,
}

impl fmt::Display for AmbiguousInterfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Multiple implementations found for {}: {}",
            self.interface,
            self.candidates.join(", ")
        )?;
        write!(
            f,
            "\n  Hint: choose one with .bind_interface(\"{}\", ...)",
            self.interface
        )
    }
}

/// Error when resolution loops back onto itself.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// Example: ["A", "B", "A"]
    pub chain: Vec<String>,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: bind one of these ids to a factory or restructure the constructors"
        )
    }
}

/// Convenient Result type for Sihr operations.
pub type Result<T> = std::result::Result<T, SihrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error_display() {
        let err = SihrError::NotFound(NotFoundError {
            id: "mailer".into(),
            required_by: Some("Notifier".into()),
            suggestions: vec!["mailer-service".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("'mailer' was not found"));
        assert!(msg.contains("Required by: Notifier"));
        assert!(msg.contains("- mailer-service"));
    }

    #[test]
    fn ambiguous_interface_display() {
        let err = SihrError::AmbiguousInterface(AmbiguousInterfaceError {
            interface: "Transport".into(),
            candidates: vec!["EmailTransport".into(), "SMSTransport".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Multiple implementations found for Transport"));
        assert!(msg.contains("EmailTransport, SMSTransport"));
        assert!(msg.contains(".bind_interface(\"Transport\""));
    }

    #[test]
    fn cyclic_dependency_display() {
        let err = SihrError::CyclicDependency(CyclicDependencyError {
            chain: vec!["A".into(), "B".into(), "A".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Circular"));
        assert!(msg.contains("A → B → A"));
    }

    #[test]
    fn unresolved_parameter_display() {
        let err = SihrError::UnresolvedParameter {
            parameter: "name".into(),
            owner: "Greeter".into(),
        };
        assert!(format!("{err}").starts_with("Cannot resolve parameter 'name' of Greeter"));
    }

    #[test]
    fn construction_wraps_source() {
        let err = SihrError::construction("Database", "connection refused");
        let msg = format!("{err}");
        assert!(msg.contains("Failed to construct Database"));
        assert!(msg.contains("connection refused"));
    }
}
