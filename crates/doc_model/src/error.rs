//! Error types for the document model

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("invalid path: {0:?}")]
    InvalidPath(Vec<usize>),

    #[error("invalid color value: {0}")]
    InvalidColor(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("{child:?} is not a valid child of {parent:?}")]
    InvalidChild {
        parent: crate::NodeType,
        child: crate::NodeType,
    },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
