//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// `--event` argument could not be parsed
    #[error("Invalid event spec '{spec}': {message}")]
    InvalidEventSpec { spec: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_event_spec(spec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEventSpec {
            spec: spec.into(),
            message: message.into(),
        }
    }
}
