//! Layered error definitions
//!
//! Categorized by source: config / transport / payload / hook

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Site connection could not be built or reached
    #[error("site connection error for '{site}': {message}")]
    SiteConnection { site: String, message: String },

    /// Remote answered with a non-success status
    #[error("site '{site}' rejected request to {url}: HTTP {status}")]
    HttpStatus {
        site: String,
        url: String,
        status: u16,
    },

    /// Server version could not be determined or parsed
    #[error("invalid server version: {0}")]
    ServerVersion(String),

    // ===== Payload Errors =====
    /// Payload serialization error
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ===== Hook Errors =====
    /// Post-dispatch hook failed
    #[error("dispatch hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create site connection error
    pub fn site_connection(site: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SiteConnection {
            site: site.into(),
            message: message.into(),
        }
    }

    /// Create hook error
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}
