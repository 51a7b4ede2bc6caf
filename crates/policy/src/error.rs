//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An action name did not match any known action.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A resource type name did not match any known resource type.
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// A role name did not match any known role.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// The rule table is invalid.
    #[error("invalid rule table: {0}")]
    Invalid(String),

    /// Failed to parse a rule table.
    #[error("failed to parse rule table: {0}")]
    Parse(String),

    /// An I/O error occurred while reading a rule table.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
