//! Error types shared by the loading crates.

/// Error type for loading scope operations.
pub type Result<T> = std::result::Result<T, LoadingError>;

/// Error type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Misuse of a loading scope.
#[derive(Debug, thiserror::Error)]
pub enum LoadingError {
    /// The provider owning the scope has been dropped
    #[error("loading provider for scope {0} has been dropped")]
    ProviderDropped(crate::ScopeId),

    /// No tokio runtime to schedule mount timers on
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Errors that can occur while reading a loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally invalid configuration
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure reported by a data-fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    /// Human readable message
    pub message: String,
}

impl QueryError {
    /// Create a query error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
