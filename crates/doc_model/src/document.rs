//! The document root and tree traversal helpers

use crate::{
    grapheme_byte_offset, DocModelError, GridMap, Node, NodeType, Position, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A complete document: an ordered sequence of top-level blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    children: Vec<Node>,
}

impl Document {
    /// An empty document with no blocks
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// The minimal editable document: one empty paragraph
    pub fn with_empty_paragraph() -> Self {
        Self {
            children: vec![Node::empty_paragraph()],
        }
    }

    /// A document from prebuilt top-level blocks
    pub fn from_blocks(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// The top-level blocks
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable access to the top-level blocks
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Resolve a child-index path to a node, if the path is in bounds
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let first = *path.first()?;
        let mut node = self.children.get(first)?;
        for &index in &path[1..] {
            node = node.children().get(index)?;
        }
        Some(node)
    }

    /// Resolve a path to a mutable node
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let first = *path.first()?;
        let mut node = self.children.get_mut(first)?;
        for &index in &path[1..] {
            node = node.children_mut().get_mut(index)?;
        }
        Some(node)
    }

    /// Resolve a path or fail with [`DocModelError::InvalidPath`]
    pub fn try_node_at(&self, path: &[usize]) -> Result<&Node> {
        self.node_at(path)
            .ok_or_else(|| DocModelError::InvalidPath(path.to_vec()))
    }

    /// Resolve a path mutably or fail with [`DocModelError::InvalidPath`]
    pub fn try_node_at_mut(&mut self, path: &[usize]) -> Result<&mut Node> {
        self.node_at_mut(path)
            .ok_or_else(|| DocModelError::InvalidPath(path.to_vec()))
    }

    /// Preorder traversal of every node with its path
    pub fn walk(&self, visit: &mut dyn FnMut(&[usize], &Node)) {
        fn recurse(node: &Node, path: &mut Vec<usize>, visit: &mut dyn FnMut(&[usize], &Node)) {
            visit(path, node);
            for (i, child) in node.children().iter().enumerate() {
                path.push(i);
                recurse(child, path, visit);
                path.pop();
            }
        }
        let mut path = Vec::new();
        for (i, child) in self.children.iter().enumerate() {
            path.push(i);
            recurse(child, &mut path, visit);
            path.pop();
        }
    }

    /// Top-level indices of every page break, in document order
    pub fn page_break_indices(&self) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, n)| n.node_type() == NodeType::PageBreak)
            .map(|(i, _)| i)
            .collect()
    }

    /// The chain of node types from the top-level block down to `path`
    pub fn type_chain(&self, path: &[usize]) -> Vec<NodeType> {
        let mut chain = Vec::new();
        for depth in 1..=path.len() {
            if let Some(node) = self.node_at(&path[..depth]) {
                chain.push(node.node_type());
            }
        }
        chain
    }

    /// The deepest ancestor of `path` (inclusive) matching the predicate,
    /// returned as its path
    pub fn find_ancestor(
        &self,
        path: &[usize],
        predicate: impl Fn(&Node) -> bool,
    ) -> Option<Vec<usize>> {
        for depth in (1..=path.len()).rev() {
            if let Some(node) = self.node_at(&path[..depth]) {
                if predicate(node) {
                    return Some(path[..depth].to_vec());
                }
            }
        }
        None
    }

    /// Concatenated text of the whole document
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            out.push_str(&child.plain_text());
        }
        out
    }

    /// Check every structural invariant of the tree
    ///
    /// Verifies child containment rules, page breaks only at top level,
    /// grapheme-consistent text offsets being representable, rectangular
    /// table grids, and at-most-one mark per type on each text node.
    pub fn validate(&self) -> Result<()> {
        for child in &self.children {
            if !NodeType::allowed_at_top_level(child.node_type()) {
                return Err(DocModelError::InvariantViolation(format!(
                    "{:?} is not allowed at the document top level",
                    child.node_type()
                )));
            }
        }

        let mut result = Ok(());
        self.walk(&mut |path, node| {
            if result.is_err() {
                return;
            }
            for child in node.children() {
                if !node.node_type().allows_child(child.node_type()) {
                    result = Err(DocModelError::InvalidChild {
                        parent: node.node_type(),
                        child: child.node_type(),
                    });
                    return;
                }
            }
            if node.node_type() == NodeType::PageBreak && path.len() > 1 {
                result = Err(DocModelError::InvariantViolation(
                    "page break below the document top level".to_string(),
                ));
                return;
            }
            if node.node_type() == NodeType::Text {
                let mut seen = BTreeSet::new();
                for mark in node.marks() {
                    if !seen.insert(mark.mark_type()) {
                        result = Err(DocModelError::InvariantViolation(format!(
                            "duplicate {:?} mark on a text node",
                            mark.mark_type()
                        )));
                        return;
                    }
                }
            }
            if node.node_type() == NodeType::Table {
                if let Err(e) = GridMap::build(node) {
                    result = Err(e);
                }
            }
        });
        result
    }

    /// Whether `pos` addresses a valid point in this tree
    pub fn position_in_bounds(&self, pos: &Position) -> bool {
        if pos.path.is_empty() {
            return pos.offset <= self.children.len();
        }
        match self.node_at(&pos.path) {
            Some(node) if node.node_type() == NodeType::Text => pos.offset <= node.text_len(),
            Some(node) => pos.offset <= node.children().len(),
            None => false,
        }
    }

    /// Byte offset of `pos` within the text node it addresses
    pub fn text_byte_offset(&self, pos: &Position) -> Option<usize> {
        let node = self.node_at(&pos.path)?;
        if node.node_type() != NodeType::Text {
            return None;
        }
        Some(grapheme_byte_offset(node.text_content(), pos.offset))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::with_empty_paragraph()
    }
}
