//! Error types for termlink.

use thiserror::Error;

use crate::ActionCategory;

/// Main error type for termlink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed `host[:port]` token
    #[error("Invalid host: {0}")]
    InvalidHostToken(String),

    /// Session or channel could not be opened
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// Secure transport reported an error
    #[error("Transport error: {0}")]
    Transport(String),

    /// PTY-related errors
    #[error("PTY error: {0}")]
    Pty(String),

    /// Read or write on an established stream failed
    #[error("Stream error: {0}")]
    Stream(String),

    /// Operation requires a connected backend
    #[error("Not connected")]
    NotConnected,

    /// A blocking wait was interrupted and may be retried
    #[error("Interrupted")]
    Interrupted,

    /// The user declined to answer a prompt
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// A termination callback was already registered
    #[error("Termination callback already registered")]
    CallbackAlreadyRegistered,

    /// Two actions with the same name in one catalog
    #[error("Duplicate {category} action: {name}")]
    DuplicateAction {
        /// Catalog category
        category: ActionCategory,
        /// Repeated action name
        name: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the operation that produced this error can simply be retried.
    pub fn is_interrupted(&self) -> bool {
        match self {
            Error::Interrupted => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::Interrupted,
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
