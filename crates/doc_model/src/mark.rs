//! Text run marks - non-structural formatting annotations

use serde::{Deserialize, Serialize};

/// A formatting mark applied to a run of text
///
/// Marks on a run form a set keyed by [`MarkType`]: applying a valued mark
/// of a type already present replaces the previous value, and removing a
/// type removes all instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    TextColor { color: String },
    Highlight { color: String },
    Link { href: String },
    Placeholder { key: String },
}

/// The type tag of a mark, used for set membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    TextColor,
    Highlight,
    Link,
    Placeholder,
}

impl Mark {
    /// Get the type tag of this mark
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Bold => MarkType::Bold,
            Mark::Italic => MarkType::Italic,
            Mark::Underline => MarkType::Underline,
            Mark::Strike => MarkType::Strike,
            Mark::Code => MarkType::Code,
            Mark::TextColor { .. } => MarkType::TextColor,
            Mark::Highlight { .. } => MarkType::Highlight,
            Mark::Link { .. } => MarkType::Link,
            Mark::Placeholder { .. } => MarkType::Placeholder,
        }
    }

    /// Serialization nesting rank, outermost first
    ///
    /// Keeping mark lists sorted by rank makes the markup writer
    /// deterministic and makes structural equality independent of the
    /// order marks were applied in.
    pub fn rank(&self) -> u8 {
        match self.mark_type() {
            MarkType::Placeholder => 0,
            MarkType::Link => 1,
            MarkType::TextColor => 2,
            MarkType::Highlight => 3,
            MarkType::Bold => 4,
            MarkType::Italic => 5,
            MarkType::Underline => 6,
            MarkType::Strike => 7,
            MarkType::Code => 8,
        }
    }
}
