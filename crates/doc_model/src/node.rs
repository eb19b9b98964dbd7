//! Core node types for the document tree
//!
//! The tree is a closed tagged-variant structure: every node carries a
//! [`NodeType`] discriminator, an attribute mapping, and owned children.
//! Text content lives in `Text` leaf nodes together with their marks.

use crate::{attrs, AttrValue, Mark, MarkType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unicode_segmentation::UnicodeSegmentation;

/// Enumeration of all node types in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Table,
    TableRow,
    TableCell,
    TableHeaderCell,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    PageBreak,
    Image,
    Text,
    HardBreak,
}

impl NodeType {
    /// Whether this node type is block-level
    pub fn is_block(self) -> bool {
        !self.is_inline()
    }

    /// Whether this node type is inline content
    pub fn is_inline(self) -> bool {
        matches!(self, NodeType::Text | NodeType::HardBreak)
    }

    /// Whether this node type never has children
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeType::HorizontalRule
                | NodeType::PageBreak
                | NodeType::Image
                | NodeType::Text
                | NodeType::HardBreak
        )
    }

    /// Whether this node type holds inline content directly
    pub fn is_textblock(self) -> bool {
        matches!(
            self,
            NodeType::Paragraph | NodeType::Heading | NodeType::CodeBlock
        )
    }

    /// Whether this node type is a table cell of either kind
    pub fn is_cell(self) -> bool {
        matches!(self, NodeType::TableCell | NodeType::TableHeaderCell)
    }

    /// Whether `child` may appear directly under this node type
    ///
    /// Mirrors the editor schema: lists hold list items, tables hold rows
    /// hold cells, cells hold blocks but never page breaks or nested
    /// tables. Page breaks are valid only at the document top level, which
    /// has no parent node and is checked by [`crate::Document::validate`].
    pub fn allows_child(self, child: NodeType) -> bool {
        match self {
            NodeType::Paragraph | NodeType::Heading => child.is_inline(),
            NodeType::CodeBlock => child == NodeType::Text,
            NodeType::BulletList | NodeType::OrderedList => child == NodeType::ListItem,
            NodeType::ListItem => matches!(
                child,
                NodeType::Paragraph | NodeType::BulletList | NodeType::OrderedList
            ),
            NodeType::Table => child == NodeType::TableRow,
            NodeType::TableRow => child.is_cell(),
            NodeType::TableCell | NodeType::TableHeaderCell => matches!(
                child,
                NodeType::Paragraph
                    | NodeType::Heading
                    | NodeType::BulletList
                    | NodeType::OrderedList
                    | NodeType::Blockquote
                    | NodeType::CodeBlock
                    | NodeType::HorizontalRule
                    | NodeType::Image
            ),
            NodeType::Blockquote => matches!(
                child,
                NodeType::Paragraph
                    | NodeType::Heading
                    | NodeType::BulletList
                    | NodeType::OrderedList
            ),
            _ => false,
        }
    }

    /// Whether `child` may appear at the document top level
    pub fn allowed_at_top_level(child: NodeType) -> bool {
        child.is_block()
            && !matches!(
                child,
                NodeType::ListItem
                    | NodeType::TableRow
                    | NodeType::TableCell
                    | NodeType::TableHeaderCell
            )
    }
}

/// One node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    node_type: NodeType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    marks: Vec<Mark>,
}

impl Node {
    /// Create an empty node of the given type
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            attrs: BTreeMap::new(),
            children: Vec::new(),
            text: String::new(),
            marks: Vec::new(),
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// A paragraph with the given inline content
    pub fn paragraph(children: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::Paragraph);
        node.children = children;
        node
    }

    /// An empty paragraph
    pub fn empty_paragraph() -> Self {
        Self::paragraph(Vec::new())
    }

    /// A heading at the given level (clamped to 1..=6)
    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::Heading);
        node.attrs.insert(
            attrs::LEVEL.to_string(),
            AttrValue::Int(level.clamp(1, 6) as i64),
        );
        node.children = children;
        node
    }

    /// A text run
    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Text);
        node.text = content.into();
        node
    }

    /// A text run with marks applied
    pub fn text_with_marks(content: impl Into<String>, marks: Vec<Mark>) -> Self {
        let mut node = Self::text(content);
        for mark in marks {
            node.add_mark(mark);
        }
        node
    }

    /// A placeholder span: a text run marked with the key, whose visible
    /// text is literally `{{key}}` until substituted
    pub fn placeholder(key: impl Into<String>) -> Self {
        let key = key.into();
        let mut node = Self::text(format!("{{{{{}}}}}", key));
        node.add_mark(Mark::Placeholder { key });
        node
    }

    /// A bullet list of list items
    pub fn bullet_list(items: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::BulletList);
        node.children = items;
        node
    }

    /// An ordered list of list items
    pub fn ordered_list(items: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::OrderedList);
        node.children = items;
        node
    }

    /// A list item wrapping block content
    pub fn list_item(children: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::ListItem);
        node.children = children;
        node
    }

    /// A table with the given rows
    pub fn table(rows: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::Table);
        node.children = rows;
        node
    }

    /// A table row with the given cells
    pub fn table_row(cells: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::TableRow);
        node.children = cells;
        node
    }

    /// A body cell; empty cells get one empty paragraph
    pub fn table_cell(children: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::TableCell);
        node.children = if children.is_empty() {
            vec![Self::empty_paragraph()]
        } else {
            children
        };
        node
    }

    /// A header cell; empty cells get one empty paragraph
    pub fn table_header_cell(children: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::TableHeaderCell);
        node.children = if children.is_empty() {
            vec![Self::empty_paragraph()]
        } else {
            children
        };
        node
    }

    /// A blockquote wrapping block content
    pub fn blockquote(children: Vec<Node>) -> Self {
        let mut node = Self::new(NodeType::Blockquote);
        node.children = children;
        node
    }

    /// A code block with literal text content
    pub fn code_block(content: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::CodeBlock);
        let content = content.into();
        if !content.is_empty() {
            node.children.push(Self::text(content));
        }
        node
    }

    /// A horizontal rule
    pub fn horizontal_rule() -> Self {
        Self::new(NodeType::HorizontalRule)
    }

    /// An explicit page break marker
    pub fn page_break() -> Self {
        Self::new(NodeType::PageBreak)
    }

    /// A block-level image
    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Image);
        node.attrs
            .insert(attrs::SRC.to_string(), AttrValue::Str(src.into()));
        let alt = alt.into();
        if !alt.is_empty() {
            node.attrs.insert(attrs::ALT.to_string(), AttrValue::Str(alt));
        }
        node
    }

    /// A hard line break
    pub fn hard_break() -> Self {
        Self::new(NodeType::HardBreak)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The type tag of this node
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Replace the type tag (used by block-type conversion commands)
    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type;
    }

    /// The attribute mapping
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// Look up one attribute
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// An integer attribute with a default (colspan, rowspan, level)
    pub fn int_attr(&self, name: &str, default: i64) -> i64 {
        self.attrs
            .get(name)
            .and_then(AttrValue::as_int)
            .unwrap_or(default)
    }

    /// A string attribute, empty when missing
    pub fn str_attr(&self, name: &str) -> &str {
        self.attrs
            .get(name)
            .and_then(AttrValue::as_str)
            .unwrap_or("")
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Remove an attribute; returns the previous value if any
    pub fn unset_attr(&mut self, name: &str) -> Option<AttrValue> {
        self.attrs.remove(name)
    }

    /// The child nodes
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable access to the child nodes
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Text payload (empty for non-text nodes)
    pub fn text_content(&self) -> &str {
        &self.text
    }

    /// Replace the text payload of a text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Text length in grapheme clusters
    pub fn text_len(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// The marks applied to this text node
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Apply a mark, replacing any existing mark of the same type and
    /// keeping the list sorted by nesting rank
    pub fn add_mark(&mut self, mark: Mark) {
        self.marks.retain(|m| m.mark_type() != mark.mark_type());
        let at = self
            .marks
            .iter()
            .position(|m| m.rank() > mark.rank())
            .unwrap_or(self.marks.len());
        self.marks.insert(at, mark);
    }

    /// Remove all marks of the given type
    pub fn remove_mark(&mut self, mark_type: MarkType) {
        self.marks.retain(|m| m.mark_type() != mark_type);
    }

    /// Whether a mark of the given type is present
    pub fn has_mark(&self, mark_type: MarkType) -> bool {
        self.marks.iter().any(|m| m.mark_type() == mark_type)
    }

    /// The mark of the given type, if present
    pub fn mark_of_type(&self, mark_type: MarkType) -> Option<&Mark> {
        self.marks.iter().find(|m| m.mark_type() == mark_type)
    }

    /// Concatenated text of this node and all descendants
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// Convert a grapheme offset into a byte offset within `text`
///
/// Offsets past the end clamp to the end of the string.
pub fn grapheme_byte_offset(text: &str, offset: usize) -> usize {
    text.grapheme_indices(true)
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(Node::heading(9, vec![]).int_attr(attrs::LEVEL, 1), 6);
        assert_eq!(Node::heading(0, vec![]).int_attr(attrs::LEVEL, 1), 1);
    }

    #[test]
    fn test_placeholder_text_is_braced_key() {
        let node = Node::placeholder("budget");
        assert_eq!(node.text_content(), "{{budget}}");
        assert!(node.has_mark(MarkType::Placeholder));
    }

    #[test]
    fn test_empty_cell_gets_paragraph() {
        let cell = Node::table_cell(vec![]);
        assert_eq!(cell.children().len(), 1);
        assert_eq!(cell.children()[0].node_type(), NodeType::Paragraph);
    }

    #[test]
    fn test_mark_set_semantics() {
        let mut node = Node::text("hello");
        node.add_mark(Mark::TextColor {
            color: "#ff0000".to_string(),
        });
        node.add_mark(Mark::TextColor {
            color: "#00ff00".to_string(),
        });
        assert_eq!(node.marks().len(), 1);
        assert_eq!(
            node.mark_of_type(MarkType::TextColor),
            Some(&Mark::TextColor {
                color: "#00ff00".to_string()
            })
        );

        node.remove_mark(MarkType::TextColor);
        assert!(!node.has_mark(MarkType::TextColor));
    }

    #[test]
    fn test_marks_stay_rank_sorted() {
        let mut node = Node::text("hello");
        node.add_mark(Mark::Code);
        node.add_mark(Mark::Bold);
        node.add_mark(Mark::Link {
            href: "https://example.com".to_string(),
        });
        let ranks: Vec<u8> = node.marks().iter().map(Mark::rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn test_child_rules() {
        assert!(NodeType::Table.allows_child(NodeType::TableRow));
        assert!(!NodeType::Table.allows_child(NodeType::Paragraph));
        assert!(!NodeType::TableCell.allows_child(NodeType::PageBreak));
        assert!(!NodeType::TableCell.allows_child(NodeType::Table));
        assert!(!NodeType::ListItem.allows_child(NodeType::PageBreak));
        assert!(NodeType::ListItem.allows_child(NodeType::BulletList));
        assert!(NodeType::allowed_at_top_level(NodeType::PageBreak));
        assert!(!NodeType::allowed_at_top_level(NodeType::ListItem));
        assert!(!NodeType::allowed_at_top_level(NodeType::Text));
    }

    #[test]
    fn test_grapheme_byte_offset() {
        assert_eq!(grapheme_byte_offset("héllo", 2), 3);
        assert_eq!(grapheme_byte_offset("ab", 10), 2);
    }

    #[test]
    fn test_plain_text() {
        let para = Node::paragraph(vec![Node::text("Cost: "), Node::placeholder("budget")]);
        assert_eq!(para.plain_text(), "Cost: {{budget}}");
    }
}
