//! Non-fatal reports produced while registering and planning.
//!
//! Nothing here aborts a render pass. Each diagnostic renders as a single
//! human-readable line; callers decide whether to log, surface or ignore it.

use serde::Serialize;

/// A recoverable anomaly in the registry or the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A module references ids that are not registered; it is left out of
    /// every output for the pass
    MissingDependencies { id: String, missing: Vec<String> },

    /// A priority or placement value was not recognized and was reset to
    /// its default
    InvalidAttribute {
        id: String,
        attribute: String,
        value: String,
    },

    /// Dependency edges form a cycle through these ids
    Cycle { ids: Vec<String> },

    /// An id is queued but was never registered
    UnregisteredEnqueue { id: String },
}

impl Diagnostic {
    /// The module id this diagnostic is about (first member for cycles).
    pub fn id(&self) -> &str {
        match self {
            Diagnostic::MissingDependencies { id, .. }
            | Diagnostic::InvalidAttribute { id, .. }
            | Diagnostic::UnregisteredEnqueue { id } => id,
            Diagnostic::Cycle { ids } => ids.first().map(String::as_str).unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingDependencies { id, missing } => write!(
                f,
                "module '{}' was not emitted because these dependencies are missing: {}",
                id,
                missing.join(", ")
            ),
            Diagnostic::InvalidAttribute { id, attribute, value } => write!(
                f,
                "module '{}' declared invalid {} '{}'; the default was used instead",
                id, attribute, value
            ),
            Diagnostic::Cycle { ids } => write!(f, "dependency cycle: {}", ids.join(" -> ")),
            Diagnostic::UnregisteredEnqueue { id } => {
                write!(f, "module '{}' is enqueued but not registered", id)
            }
        }
    }
}
