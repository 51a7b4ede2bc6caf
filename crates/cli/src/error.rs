//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A subject argument is neither a resource type nor a typeable object.
    #[error("invalid subject: {0}")]
    InvalidSubject(String),

    /// A route parameter is not of the form `key=value`.
    #[error("invalid route parameter '{0}': expected key=value")]
    InvalidParam(String),

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),

    /// An error occurred in the request gate.
    #[error(transparent)]
    Guard(#[from] guard::Error),

    /// An error occurred on the command channel.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
