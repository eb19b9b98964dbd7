//! Store - Persistence, serialization, and export
//!
//! This crate handles the document markup codec, saved-proposal
//! persistence, autosave, placeholder value storage, the template
//! gallery, and print/HTML/PDF export transforms.

mod autosave;
mod error;
mod proposal;
mod templates;
mod values;
pub mod export;
pub mod markup;

pub use autosave::{AutosaveConfig, AutosaveManager};
pub use error::{Result, StoreError};
pub use proposal::{ProposalStore, SavedProposal};
pub use templates::{builtin_template, builtin_templates, default_document, Template};
pub use values::{load_values, save_values};

// Re-export export functionality
pub use export::{
    export_html, image_data_uri, sanitize_for_print, snapshot_json, ExportJob, ImageProbe,
    Margin, Orientation, PdfOptions, Rasterizer,
};

// Re-export the markup codec
pub use markup::{deserialize, serialize};
