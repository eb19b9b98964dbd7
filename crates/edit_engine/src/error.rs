//! Error types for editing operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// The command's preconditions do not hold at the current selection.
    /// Callers treat this as a clean no-op: the document is unchanged and
    /// nothing is pushed onto the undo stack.
    #[error("Command not applicable: {0}")]
    NotApplicable(String),

    #[error("Invalid command input: {0}")]
    InvalidInput(String),

    #[error("Position out of bounds")]
    InvalidPosition,

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Undo stack is empty")]
    UndoStackEmpty,

    #[error("Redo stack is empty")]
    RedoStackEmpty,
}

impl EditError {
    /// Whether this error means "nothing to do here" rather than a fault
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, EditError::NotApplicable(_))
    }
}

pub type Result<T> = std::result::Result<T, EditError>;
