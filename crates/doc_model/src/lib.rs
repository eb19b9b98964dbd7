//! Document model for the proposal editor
//!
//! Defines the tree of typed nodes, marks on text runs, positions and
//! selections, table grid geometry, and the structural invariants every
//! well-formed document upholds. Editing semantics live in `edit_engine`;
//! persistence and markup conversion live in `store`.

pub mod attr;
pub mod color;
pub mod document;
pub mod error;
pub mod mark;
pub mod node;
pub mod selection;
pub mod table;

pub use attr::{attrs, AttrValue};
pub use color::{is_print_safe, is_valid_color, is_valid_url};
pub use document::Document;
pub use error::{DocModelError, Result};
pub use mark::{Mark, MarkType};
pub use node::{grapheme_byte_offset, Node, NodeType};
pub use selection::{Position, Selection};
pub use table::{col_span, row_span, CellRef, GridMap};
