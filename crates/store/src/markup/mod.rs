//! Markup round-trip: the persisted wire form of a document

mod reader;
mod writer;

pub use reader::deserialize;
pub use writer::serialize;
