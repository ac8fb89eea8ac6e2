//! Centralized error types for the Zotero client.
//!
//! Every fallible operation in the crate returns [`ZoteroError`]. Argument
//! problems are always detected before any I/O takes place, so callers can
//! rely on an `InvalidArgument` never having touched the network.

use thiserror::Error;

/// Errors that can occur while resolving credentials or calling the API.
#[derive(Debug, Error)]
pub enum ZoteroError {
    /// The caller passed a malformed input (bad verb, empty key, wrong library).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An interactively supplied value failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credential creation was attempted without an interactive terminal.
    #[error("Environment error: {0}")]
    Environment(String),

    /// The user declined or cancelled an overwrite confirmation.
    #[error("Aborted by user")]
    Aborted,

    /// The remote service did not answer within the configured window.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The remote service answered with a client or server error status.
    #[error("Request failed with HTTP {status}: {body}")]
    RequestFailed {
        /// HTTP status code returned by the service.
        status: u16,
        /// Raw response body, kept for caller inspection.
        body: String,
    },

    /// Transport failure other than a timeout.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// No per-user configuration directory exists on this platform.
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    /// Filesystem errors while reading or writing profiles.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record or log export could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ZoteroError>;

impl ZoteroError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ZoteroError::InvalidArgument(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ZoteroError::InvalidInput(msg.into())
    }

    /// HTTP status carried by a `RequestFailed` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ZoteroError::RequestFailed { status, .. } => Some(*status),
            ZoteroError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            ZoteroError::InvalidArgument(msg) => format!("Invalid argument: {}", msg),
            ZoteroError::InvalidInput(msg) => {
                format!("The value entered is not valid: {}", msg)
            }
            ZoteroError::Environment(_) => {
                "A new profile can only be created from an interactive terminal.".to_string()
            }
            ZoteroError::Aborted => "The operation was cancelled.".to_string(),
            ZoteroError::Timeout(secs) => format!(
                "Zotero did not respond within {} seconds. Please try again later.",
                secs
            ),
            ZoteroError::RequestFailed { status, .. } => match status {
                400 => "Zotero rejected the request parameters.".to_string(),
                403 => "Access denied. Check the API key permissions for this library.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => "Zotero server error. Please try again later.".to_string(),
                other => format!("Zotero answered with HTTP {}.", other),
            },
            ZoteroError::Network(_) => {
                "Connection failed. Please check your internet connection.".to_string()
            }
            ZoteroError::NoConfigDir => {
                "Could not find configuration directory. Please check your system settings."
                    .to_string()
            }
            ZoteroError::Io(_) => {
                "A file operation failed. Please check file permissions.".to_string()
            }
            ZoteroError::Serialization(_) => {
                "A stored profile is unreadable. Recreate it to continue.".to_string()
            }
        }
    }
}

impl From<toml::de::Error> for ZoteroError {
    fn from(err: toml::de::Error) -> Self {
        ZoteroError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for ZoteroError {
    fn from(err: toml::ser::Error) -> Self {
        ZoteroError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ZoteroError {
    fn from(err: serde_json::Error) -> Self {
        ZoteroError::Serialization(err.to_string())
    }
}
