//! Centralized error types for IFCG.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for IFCG core operations.
#[derive(Error, Debug)]
pub enum IfcgError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("STEP parse error at #{entity}: {message}")]
    Parse { entity: u32, message: String },

    #[error("STEP file has no DATA section")]
    MissingDataSection,

    #[error("Graph node not found: nid {0}")]
    NodeNotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for IFCG core operations.
pub type IfcgResult<T> = Result<T, IfcgError>;

impl IfcgError {
    /// Create a parse error for the statement with the given id.
    pub fn parse(entity: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            entity,
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}

impl From<toml::de::Error> for IfcgError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
