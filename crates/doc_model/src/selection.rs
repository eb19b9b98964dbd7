//! Positions and selections over the document tree
//!
//! A [`Position`] addresses a point in the tree by child-index path plus
//! an offset. Inside a text node the offset counts grapheme clusters;
//! inside an element node it is a boundary index between children. The
//! derived ordering is document order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A point in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Child indices from the document root down to the addressed node
    pub path: Vec<usize>,
    /// Grapheme offset in a text node, boundary index in an element
    pub offset: usize,
}

impl Position {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// The boundary before the first top-level block
    pub fn doc_start() -> Self {
        Self {
            path: Vec::new(),
            offset: 0,
        }
    }

    /// The top-level child index this position sits in (or before)
    pub fn top_level_index(&self) -> usize {
        match self.path.first() {
            Some(&i) => i,
            None => self.offset,
        }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    /// Document order: lexicographic over path with the offset acting as a
    /// final path component
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.path.iter().copied().chain(std::iter::once(self.offset));
        let b = other
            .path
            .iter()
            .copied()
            .chain(std::iter::once(other.offset));
        a.cmp(b)
    }
}

/// An anchor/head pair; collapsed when both ends coincide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// A collapsed selection at one point
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position.clone(),
            head: position,
        }
    }

    /// A caret at the very start of the document
    pub fn doc_start() -> Self {
        Self::caret(Position::doc_start())
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    /// The end earlier in document order
    pub fn start(&self) -> &Position {
        if self.anchor <= self.head {
            &self.anchor
        } else {
            &self.head
        }
    }

    /// The end later in document order
    pub fn end(&self) -> &Position {
        if self.anchor <= self.head {
            &self.head
        } else {
            &self.anchor
        }
    }
}
