//! Error types for storage and export operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Malformed markup: {0}")]
    InvalidMarkup(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl From<quick_xml::Error> for StoreError {
    fn from(err: quick_xml::Error) -> Self {
        StoreError::InvalidMarkup(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for StoreError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        StoreError::InvalidMarkup(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
