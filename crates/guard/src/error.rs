//! Guard error types.

use thiserror::Error;

/// Request-gate errors.
///
/// `Forbidden` deliberately carries no detail about which rule or predicate
/// failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No principal is attached to the request, or it could not be resolved.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The principal is known but a declared policy denied the request.
    #[error("forbidden")]
    Forbidden,

    /// A route or requirement is declared incorrectly.
    #[error("misconfigured policy: {0}")]
    Misconfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;
