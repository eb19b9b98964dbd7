//! Placeholder tokens of the form `{{key}}`
//!
//! Placeholders are plain text: they survive serialization as their
//! literal braced form and are substituted only at export time. This
//! crate finds them, validates keys, and applies saved values.

pub mod engine;
pub mod values;

pub use engine::{apply_values, extract_placeholders, is_valid_key, seed_values};
pub use values::PlaceholderValues;
