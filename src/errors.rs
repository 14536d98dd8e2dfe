//! Error types for netpilot
//!
//! Entity failures (tasks, stages, bulk operations, pipelines) are recorded as
//! data on the entity itself. This enum is what crosses the public boundary:
//! synchronous misuse, unknown IDs, and the internal failures that get captured
//! into those `error` fields.

use thiserror::Error;

/// Main error type for the orchestration engine
#[derive(Error, Debug)]
pub enum NetError {
    /// Completion provider failed or returned nothing usable
    #[error("Provider error: {0}")]
    Provider(String),

    /// Completion provider did not answer in time
    #[error("Provider timed out after {duration_ms}ms")]
    ProviderTimeout { duration_ms: u64 },

    /// Referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// No agent registered for the requested role
    #[error("No agent registered for role '{0}'")]
    NoAgentForRole(String),

    /// Generated configuration failed validation
    #[error("Configuration validation failed: {}", .0.join("; "))]
    ValidationFailure(Vec<String>),

    /// At least one target device rejected a deployment
    #[error("Deployment failed on {} device(s): {}", .failed.len(), .failed.join(", "))]
    DeploymentFailure { failed: Vec<String> },

    /// Status state machine transition errors
    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Malformed call parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Structured reply could not be parsed
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl NetError {
    /// Shorthand for a lookup miss
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        NetError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NetError::Provider(_) | NetError::ProviderTimeout { .. } | NetError::HttpError(_)
        )
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, NetError>;

/// Convert anyhow errors to NetError
impl From<anyhow::Error> for NetError {
    fn from(err: anyhow::Error) -> Self {
        NetError::Generic(err.to_string())
    }
}
