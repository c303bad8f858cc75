//! Error definitions for response mutation.

use thiserror::Error;

/// Errors returned by [`ResponseFacade`](crate::http::ResponseFacade) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// An argument was rejected before reaching the host
    /// (status code out of range, malformed header or cookie).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Headers were already transmitted; the response can no longer change.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl ResponseError {
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Result type for response operations.
pub type ResponseResult<T> = Result<T, ResponseError>;
