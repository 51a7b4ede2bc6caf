//! Command-channel error types.

use policy::Action;
use thiserror::Error;

use crate::Target;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The message was denied; the operation was not executed.
    #[error("not permitted to {action} {target}")]
    Forbidden { action: Action, target: Target },

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    #[error(transparent)]
    Guard(#[from] guard::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
