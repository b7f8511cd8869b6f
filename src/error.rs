//! Error types for modsched
//!
//! Scheduling itself never fails; anomalies in the graph surface as
//! diagnostics. These errors cover the fallible edges: reading manifests and
//! serializing output.

use thiserror::Error;

/// All error types that can occur in modsched
#[derive(Debug, Error)]
pub enum ModschedError {
    /// Manifest content is structurally wrong
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Requested output format does not exist
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for modsched operations
pub type Result<T> = std::result::Result<T, ModschedError>;
