//! Error types for the panelsync engine.

use crate::dispatcher::DispatchToken;
use thiserror::Error;

/// All possible errors from the panelsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    #[error("dispatch called while another dispatch is in progress")]
    ReentrantDispatch,

    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    // Payload errors
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A handler that failed while an action was being delivered.
///
/// Failures are isolated per handler: they are collected into the
/// [`DispatchReport`](crate::DispatchReport) and never abort delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Token of the handler that failed
    pub token: DispatchToken,
    /// What went wrong
    pub error: Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::ReentrantDispatch;
        assert_eq!(
            err.to_string(),
            "dispatch called while another dispatch is in progress"
        );

        let err = Error::InvalidPayload("missing field `id`".into());
        assert_eq!(err.to_string(), "invalid payload: missing field `id`");

        let err = Error::HandlerPanicked("boom".into());
        assert_eq!(err.to_string(), "handler panicked: boom");
    }
}
