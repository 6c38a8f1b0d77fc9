//! Static wiring check.
//!
//! Walks the type graph extracted by
//! [`Container::validate`](crate::Container::validate) before anything is
//! constructed, reporting cycles between constructors and references to
//! types nobody registered.

use std::collections::HashMap;

use tracing::{debug, instrument, trace, warn};

use crate::error::{CyclicDependencyError, NotFoundError, SihrError};

/// A registered type and the concrete types its constructor pulls in.
#[derive(Debug, Clone)]
pub(crate) struct DependencyInfo {
    pub key: String,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current search path.
    Open,
    /// Fully explored, no cycle below.
    Done,
}

/// Depth-first search over [`DependencyInfo`] nodes.
pub(crate) struct GraphValidator {
    nodes: HashMap<String, DependencyInfo>,
    marks: HashMap<String, Mark>,
    trail: Vec<String>,
}

impl GraphValidator {
    pub fn new(nodes: HashMap<String, DependencyInfo>) -> Self {
        Self {
            nodes,
            marks: HashMap::new(),
            trail: Vec::new(),
        }
    }

    /// Checks every node, in name order so failures are reproducible.
    ///
    /// # Errors
    /// - [`SihrError::CyclicDependency`] with the offending chain
    /// - [`SihrError::NotFound`] when a dependency is not a node
    #[instrument(skip(self), name = "wiring_check")]
    pub fn validate(&mut self) -> Result<(), SihrError> {
        let mut roots: Vec<String> = self.nodes.keys().cloned().collect();
        roots.sort();

        debug!(nodes = roots.len(), "Checking wiring");
        for root in &roots {
            self.visit(root)?;
        }
        debug!("Wiring check passed");

        Ok(())
    }

    fn visit(&mut self, key: &str) -> Result<(), SihrError> {
        match self.marks.get(key) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Open) => {
                let start = self.trail.iter().position(|k| k == key).unwrap_or(0);
                let mut chain = self.trail[start..].to_vec();
                chain.push(key.to_string());

                warn!(cycle = ?chain, "Circular dependency detected!");
                return Err(SihrError::CyclicDependency(CyclicDependencyError { chain }));
            }
            None => {}
        }

        let Some(node) = self.nodes.get(key) else {
            return Err(self.missing(key));
        };
        trace!(type_name = %node.key, dependencies = ?node.dependencies, "Visiting");
        let dependencies = node.dependencies.clone();

        self.marks.insert(key.to_string(), Mark::Open);
        self.trail.push(key.to_string());

        for dependency in &dependencies {
            self.visit(dependency)?;
        }

        self.trail.pop();
        self.marks.insert(key.to_string(), Mark::Done);
        Ok(())
    }

    fn missing(&self, key: &str) -> SihrError {
        let known: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        SihrError::NotFound(NotFoundError {
            id: key.to_string(),
            required_by: self.trail.last().cloned(),
            suggestions: sihr_support::rendering::suggest_similar(key, &known, 3),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, dependencies: &[&str]) -> (String, DependencyInfo) {
        let info = DependencyInfo {
            key: key.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        };
        (info.key.clone(), info)
    }

    fn validate<const N: usize>(nodes: [(String, DependencyInfo); N]) -> Result<(), SihrError> {
        GraphValidator::new(nodes.into_iter().collect()).validate()
    }

    #[test]
    fn chain_of_types_passes() {
        let result = validate([
            node("SmsTransport", &[]),
            node("Notifier", &["SmsTransport"]),
            node("Alerts", &["Notifier"]),
        ]);

        assert!(result.is_ok());
    }

    #[test]
    fn three_type_cycle_reports_chain() {
        let result = validate([node("A", &["B"]), node("B", &["C"]), node("C", &["A"])]);

        match result.unwrap_err() {
            SihrError::CyclicDependency(err) => {
                assert_eq!(err.chain, ["A", "B", "C", "A"]);
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn type_depending_on_itself() {
        match validate([node("Recursive", &["Recursive"])]).unwrap_err() {
            SihrError::CyclicDependency(err) => {
                assert_eq!(err.chain, ["Recursive", "Recursive"]);
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_dependency_names_dependent() {
        match validate([node("Notifier", &["Transport"])]).unwrap_err() {
            SihrError::NotFound(err) => {
                assert_eq!(err.id, "Transport");
                assert_eq!(err.required_by.as_deref(), Some("Notifier"));
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn shared_dependency_is_not_a_cycle() {
        let result = validate([
            node("Clock", &[]),
            node("Scheduler", &["Clock"]),
            node("Audit", &["Clock"]),
            node("App", &["Scheduler", "Audit"]),
        ]);

        assert!(result.is_ok());
    }
}
