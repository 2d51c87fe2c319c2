//! Configuration errors.

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No candidate path could be read
    #[error("failed to read config file from any location (tried {}): {source}", .tried.join(", "))]
    Read {
        /// Every path attempted, in order
        tried: Vec<String>,
        /// Error from the last attempt
        #[source]
        source: std::io::Error,
    },

    /// One or more `${NAME}` references have no value
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),

    /// YAML could not be deserialized
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The configuration is structurally invalid
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
