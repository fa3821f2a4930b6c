//! Error types surfaced by the engine
//!
//! Parse failures and dangling references are recovered where they happen and
//! never show up here.

use thiserror::Error;

/// Failure reported by an `ObjectSource` collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{message}")]
    Failed { message: String, code: Option<u16> },
    #[error("request cancelled")]
    Cancelled,
}

impl RequestError {
    pub fn new(message: impl Into<String>, code: Option<u16>) -> Self {
        RequestError::Failed {
            message: message.into(),
            code,
        }
    }

    /// Numeric status code, when the collaborator reported one
    pub fn code(&self) -> Option<u16> {
        match self {
            RequestError::Failed { code, .. } => *code,
            RequestError::Cancelled => None,
        }
    }
}

/// The tree handed to `flatten` was not produced by the ownership resolver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("object {id} has no children field; it was not resolved as part of a tree")]
    MissingChildren { id: String },
}
