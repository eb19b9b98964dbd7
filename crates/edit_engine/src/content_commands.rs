//! Text and block content commands

use crate::{Command, CommandResult, EditError, RestoreContent, Result};
use doc_model::{
    grapheme_byte_offset, Document, Node, NodeType, Position, Selection,
};
use unicode_segmentation::UnicodeSegmentation;

/// Index at which a new top-level block lands for the given position:
/// after the block the position sits in, or at the boundary itself when
/// the position is a top-level boundary
pub(crate) fn top_level_insert_index(pos: &Position) -> usize {
    match pos.path.first() {
        Some(&i) => i + 1,
        None => pos.offset,
    }
}

/// Path of the textblock enclosing `path`, if any
pub(crate) fn enclosing_textblock(doc: &Document, path: &[usize]) -> Option<Vec<usize>> {
    doc.find_ancestor(path, |n| n.node_type().is_textblock())
        .or_else(|| {
            // The position may address the textblock itself.
            doc.node_at(path)
                .filter(|n| n.node_type().is_textblock())
                .map(|_| path.to_vec())
        })
}

// =============================================================================
// InsertText
// =============================================================================

/// Insert text at a caret inside a text node (or into an empty textblock)
#[derive(Debug, Clone)]
pub struct InsertText {
    pub position: Position,
    pub text: String,
}

impl InsertText {
    pub fn new(position: Position, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }

    fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// Inverse for an insertion into an existing text node: the deletion
    /// spanning exactly the inserted graphemes
    pub(crate) fn inverted(&self) -> Box<dyn Command> {
        let end = Position::new(
            self.position.path.clone(),
            self.position.offset + self.grapheme_count(),
        );
        Box::new(DeleteRange::new(self.position.clone(), end))
    }
}

impl Command for InsertText {
    fn apply(&self, doc: &Document, _selection: &Selection) -> Result<CommandResult> {
        if self.text.is_empty() {
            return Err(EditError::NotApplicable("empty insertion".to_string()));
        }
        let mut new_doc = doc.clone();
        let target = new_doc
            .node_at_mut(&self.position.path)
            .ok_or(EditError::InvalidPosition)?;

        let inserted = self.grapheme_count();
        let (end_path, end_offset) = match target.node_type() {
            NodeType::Text => {
                if self.position.offset > target.text_len() {
                    return Err(EditError::InvalidPosition);
                }
                let byte = grapheme_byte_offset(target.text_content(), self.position.offset);
                let mut text = target.text_content().to_string();
                text.insert_str(byte, &self.text);
                target.set_text(text);
                (self.position.path.clone(), self.position.offset + inserted)
            }
            t if t.is_textblock() => {
                // Boundary position inside a textblock: append a text run.
                if self.position.offset > target.children().len() {
                    return Err(EditError::InvalidPosition);
                }
                let at = self.position.offset;
                target.children_mut().insert(at, Node::text(self.text.clone()));
                let mut path = self.position.path.clone();
                path.push(at);
                (path, inserted)
            }
            _ => {
                return Err(EditError::NotApplicable(
                    "caret is not in text content".to_string(),
                ))
            }
        };

        let end = Position::new(end_path, end_offset);
        let inverse = Box::new(DeleteRange::new(
            Position::new(end.path.clone(), end.offset - inserted),
            end.clone(),
        ));

        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(end),
            inverse,
        })
    }

    fn merge_with(&self, other: &dyn Command) -> Option<Box<dyn Command>> {
        let next = other.as_insert_text()?;
        // Mergeable only when the later insertion continues exactly where
        // this one ended, within the same text node.
        if next.position.path == self.position.path
            && next.position.offset == self.position.offset + self.grapheme_count()
        {
            return Some(Box::new(InsertText::new(
                self.position.clone(),
                format!("{}{}", self.text, next.text),
            )));
        }
        None
    }

    fn as_insert_text(&self) -> Option<&InsertText> {
        Some(self)
    }

    fn display_name(&self) -> &str {
        "Insert Text"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// DeleteRange
// =============================================================================

/// Delete the content between two positions
///
/// Supported shapes: a range within one text node, a range spanning
/// inline children of one textblock, and a range of whole top-level
/// blocks. Anything else reports `NotApplicable`.
#[derive(Debug, Clone)]
pub struct DeleteRange {
    pub start: Position,
    pub end: Position,
}

impl DeleteRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    fn delete_in_text(doc: &mut Document, start: &Position, end: &Position) -> Result<String> {
        let node = doc
            .node_at_mut(&start.path)
            .ok_or(EditError::InvalidPosition)?;
        if node.node_type() != NodeType::Text || end.offset > node.text_len() {
            return Err(EditError::InvalidPosition);
        }
        let from = grapheme_byte_offset(node.text_content(), start.offset);
        let to = grapheme_byte_offset(node.text_content(), end.offset);
        let removed = node.text_content()[from..to].to_string();
        let mut text = node.text_content().to_string();
        text.replace_range(from..to, "");
        node.set_text(text);
        Ok(removed)
    }
}

impl Command for DeleteRange {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        if self.start >= self.end {
            return Err(EditError::NotApplicable("empty range".to_string()));
        }
        if !doc.position_in_bounds(&self.start) || !doc.position_in_bounds(&self.end) {
            return Err(EditError::InvalidPosition);
        }

        let mut new_doc = doc.clone();

        // Range within one text node: precise inverse.
        if self.start.path == self.end.path {
            if let Some(node) = doc.node_at(&self.start.path) {
                if node.node_type() == NodeType::Text {
                    let removed = Self::delete_in_text(&mut new_doc, &self.start, &self.end)?;
                    let caret = Selection::caret(self.start.clone());
                    let inverse = Box::new(InsertText::new(self.start.clone(), removed));
                    return Ok(CommandResult {
                        doc: new_doc,
                        selection: caret,
                        inverse,
                    });
                }
            }
        }

        let inverse = RestoreContent::snapshot(doc, selection);

        // Whole top-level blocks.
        if self.start.path.is_empty() && self.end.path.is_empty() {
            new_doc.children_mut().drain(self.start.offset..self.end.offset);
            if new_doc.children().is_empty() {
                new_doc.children_mut().push(Node::empty_paragraph());
            }
            let caret = Selection::caret(Position::new(
                vec![],
                self.start.offset.min(new_doc.children().len()),
            ));
            return Ok(CommandResult {
                doc: new_doc,
                selection: caret,
                inverse,
            });
        }

        // Inline range spanning children of one textblock.
        if self.start.path.len() == self.end.path.len() && self.start.path.len() >= 2 {
            let (block, start_child) = self.start.path.split_at(self.start.path.len() - 1);
            let (end_block, end_child) = self.end.path.split_at(self.end.path.len() - 1);
            if block == end_block {
                let parent = new_doc
                    .node_at_mut(block)
                    .ok_or(EditError::InvalidPosition)?;
                if parent.node_type().is_textblock() {
                    let (i, j) = (start_child[0], end_child[0]);

                    // Trim the tail of the end child, drop the middles,
                    // then trim the head of the start child.
                    let end_node = &mut parent.children_mut()[j];
                    if end_node.node_type() == NodeType::Text {
                        let to = grapheme_byte_offset(end_node.text_content(), self.end.offset);
                        let kept = end_node.text_content()[to..].to_string();
                        end_node.set_text(kept);
                    } else if self.end.offset > 0 {
                        // A fully covered inline leaf is removed outright.
                        parent.children_mut().remove(j);
                    }
                    parent.children_mut().drain(i + 1..j);
                    let start_node = &mut parent.children_mut()[i];
                    if start_node.node_type() == NodeType::Text {
                        let from =
                            grapheme_byte_offset(start_node.text_content(), self.start.offset);
                        let kept = start_node.text_content()[..from].to_string();
                        start_node.set_text(kept);
                    }
                    parent
                        .children_mut()
                        .retain(|n| n.node_type() != NodeType::Text || !n.text_content().is_empty());

                    let caret = Selection::caret(self.start.clone());
                    return Ok(CommandResult {
                        doc: new_doc,
                        selection: caret,
                        inverse,
                    });
                }
            }
        }

        Err(EditError::NotApplicable(
            "range spans structures that must be deleted block-wise".to_string(),
        ))
    }

    fn display_name(&self) -> &str {
        "Delete"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// InsertNode
// =============================================================================

/// Insert a block at the document top level, after the caret's block
#[derive(Debug, Clone)]
pub struct InsertNode {
    pub node: Node,
}

impl InsertNode {
    pub fn new(node: Node) -> Self {
        Self { node }
    }
}

impl Command for InsertNode {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        if !NodeType::allowed_at_top_level(self.node.node_type()) {
            return Err(EditError::InvalidInput(format!(
                "{:?} cannot stand at the document top level",
                self.node.node_type()
            )));
        }
        let mut new_doc = doc.clone();
        let at = top_level_insert_index(&selection.head).min(new_doc.children().len());
        new_doc.children_mut().insert(at, self.node.clone());
        new_doc.validate()?;

        let inverse = RestoreContent::snapshot(doc, selection);
        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(Position::new(vec![], at + 1)),
            inverse,
        })
    }

    fn display_name(&self) -> &str {
        "Insert Block"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// ReplaceContent
// =============================================================================

/// Replace the entire document (template load, proposal open)
#[derive(Debug, Clone)]
pub struct ReplaceContent {
    pub doc: Document,
}

impl ReplaceContent {
    pub fn new(doc: Document) -> Self {
        Self { doc }
    }
}

impl Command for ReplaceContent {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        self.doc.validate()?;
        let mut new_doc = self.doc.clone();
        if new_doc.children().is_empty() {
            new_doc.children_mut().push(Node::empty_paragraph());
        }
        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::doc_start(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Replace Content"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// SetBlockType
// =============================================================================

/// Target shape for block-type conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    CodeBlock,
}

/// Convert the textblock under the caret to another textblock kind
#[derive(Debug, Clone)]
pub struct SetBlockType {
    pub kind: BlockKind,
}

impl SetBlockType {
    pub fn new(kind: BlockKind) -> Self {
        Self { kind }
    }
}

impl Command for SetBlockType {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let block_path = enclosing_textblock(doc, &selection.head.path).ok_or_else(|| {
            EditError::NotApplicable("caret is not inside a convertible block".to_string())
        })?;

        let mut new_doc = doc.clone();
        let block = new_doc.try_node_at_mut(&block_path)?;

        match self.kind {
            BlockKind::Paragraph => {
                block.set_node_type(NodeType::Paragraph);
                block.unset_attr(doc_model::attrs::LEVEL);
            }
            BlockKind::Heading(level) => {
                if !(1..=6).contains(&level) {
                    return Err(EditError::InvalidInput(format!(
                        "heading level {level} out of range"
                    )));
                }
                block.set_node_type(NodeType::Heading);
                block.set_attr(doc_model::attrs::LEVEL, level as i64);
            }
            BlockKind::CodeBlock => {
                // Code blocks carry one unmarked text run.
                let flat = block.plain_text();
                block.set_node_type(NodeType::CodeBlock);
                block.unset_attr(doc_model::attrs::LEVEL);
                block.children_mut().clear();
                if !flat.is_empty() {
                    block.children_mut().push(Node::text(flat));
                }
            }
        }
        new_doc.validate()?;

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Set Block Type"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// InsertPlaceholder
// =============================================================================

/// Insert a `{{key}}` placeholder run at the caret
#[derive(Debug, Clone)]
pub struct InsertPlaceholder {
    pub key: String,
}

impl InsertPlaceholder {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Command for InsertPlaceholder {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        if !placeholders::is_valid_key(&self.key) {
            return Err(EditError::InvalidInput(format!(
                "invalid placeholder key {:?}",
                self.key
            )));
        }
        let head = &selection.head;
        let mut new_doc = doc.clone();
        let inverse = RestoreContent::snapshot(doc, selection);

        let target = new_doc
            .node_at(&head.path)
            .ok_or(EditError::InvalidPosition)?;

        let (parent_path, child_index) = match target.node_type() {
            NodeType::Text => {
                // Split the run at the caret and slot the placeholder in
                // between the halves.
                let (parent_path, child) = head.path.split_at(head.path.len() - 1);
                let parent_path = parent_path.to_vec();
                let child = child[0];
                let byte = grapheme_byte_offset(target.text_content(), head.offset);
                let (before, after) = {
                    let t = target.text_content();
                    (t[..byte].to_string(), t[byte..].to_string())
                };
                let marks = target.marks().to_vec();
                let parent = new_doc
                    .node_at_mut(&parent_path)
                    .ok_or(EditError::InvalidPosition)?;
                parent.children_mut().remove(child);
                let mut at = child;
                if !before.is_empty() {
                    parent
                        .children_mut()
                        .insert(at, Node::text_with_marks(before, marks.clone()));
                    at += 1;
                }
                parent
                    .children_mut()
                    .insert(at, Node::placeholder(&self.key));
                if !after.is_empty() {
                    parent
                        .children_mut()
                        .insert(at + 1, Node::text_with_marks(after, marks));
                }
                (parent_path, at)
            }
            t if t.is_textblock() => {
                let at = head.offset.min(target.children().len());
                let parent = new_doc
                    .node_at_mut(&head.path)
                    .ok_or(EditError::InvalidPosition)?;
                parent
                    .children_mut()
                    .insert(at, Node::placeholder(&self.key));
                (head.path.clone(), at)
            }
            _ => {
                return Err(EditError::NotApplicable(
                    "caret is not in text content".to_string(),
                ))
            }
        };

        let mut caret_path = parent_path;
        caret_path.push(child_index);
        let caret_offset = new_doc
            .node_at(&caret_path)
            .map(Node::text_len)
            .unwrap_or(0);

        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(Position::new(caret_path, caret_offset)),
            inverse,
        })
    }

    fn display_name(&self) -> &str {
        "Insert Placeholder"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::MarkType;

    fn one_para(text: &str) -> Document {
        Document::from_blocks(vec![Node::paragraph(vec![Node::text(text)])])
    }

    #[test]
    fn test_insert_text_in_run() {
        let doc = one_para("helo");
        let sel = Selection::caret(Position::new(vec![0, 0], 3));
        let cmd = InsertText::new(Position::new(vec![0, 0], 3), "l");
        let result = cmd.apply(&doc, &sel).unwrap();
        assert_eq!(result.doc.node_at(&[0, 0]).unwrap().text_content(), "hello");
        assert_eq!(result.selection.head.offset, 4);
    }

    #[test]
    fn test_insert_text_inverse_round_trips() {
        let doc = one_para("abc");
        let sel = Selection::caret(Position::new(vec![0, 0], 1));
        let cmd = InsertText::new(Position::new(vec![0, 0], 1), "xyz");
        let result = cmd.apply(&doc, &sel).unwrap();
        let undone = result.inverse.apply(&result.doc, &result.selection).unwrap();
        assert_eq!(undone.doc, doc);
    }

    #[test]
    fn test_insert_text_grapheme_offsets() {
        let doc = one_para("a\u{1F469}\u{200D}\u{1F4BB}b");
        let sel = Selection::caret(Position::new(vec![0, 0], 2));
        let cmd = InsertText::new(Position::new(vec![0, 0], 2), "!");
        let result = cmd.apply(&doc, &sel).unwrap();
        assert_eq!(
            result.doc.node_at(&[0, 0]).unwrap().text_content(),
            "a\u{1F469}\u{200D}\u{1F4BB}!b"
        );
    }

    #[test]
    fn test_insert_text_into_empty_paragraph() {
        let doc = Document::with_empty_paragraph();
        let sel = Selection::caret(Position::new(vec![0], 0));
        let cmd = InsertText::new(Position::new(vec![0], 0), "hi");
        let result = cmd.apply(&doc, &sel).unwrap();
        assert_eq!(result.doc.node_at(&[0, 0]).unwrap().text_content(), "hi");
    }

    #[test]
    fn test_insert_text_merge() {
        let a = InsertText::new(Position::new(vec![0, 0], 0), "ab");
        let b = InsertText::new(Position::new(vec![0, 0], 2), "cd");
        let merged = a.merge_with(&b).unwrap();
        let doc = one_para("");
        let sel = Selection::caret(Position::new(vec![0, 0], 0));
        let result = merged.apply(&doc, &sel).unwrap();
        assert_eq!(result.doc.node_at(&[0, 0]).unwrap().text_content(), "abcd");

        let gap = InsertText::new(Position::new(vec![0, 0], 9), "zz");
        assert!(a.merge_with(&gap).is_none());
    }

    #[test]
    fn test_delete_range_in_run() {
        let doc = one_para("hello world");
        let sel = Selection::doc_start();
        let cmd = DeleteRange::new(Position::new(vec![0, 0], 5), Position::new(vec![0, 0], 11));
        let result = cmd.apply(&doc, &sel).unwrap();
        assert_eq!(result.doc.node_at(&[0, 0]).unwrap().text_content(), "hello");
        let undone = result.inverse.apply(&result.doc, &result.selection).unwrap();
        assert_eq!(undone.doc, doc);
    }

    #[test]
    fn test_delete_whole_blocks() {
        let doc = Document::from_blocks(vec![
            Node::paragraph(vec![Node::text("one")]),
            Node::page_break(),
            Node::paragraph(vec![Node::text("two")]),
        ]);
        let sel = Selection::doc_start();
        let cmd = DeleteRange::new(Position::new(vec![], 1), Position::new(vec![], 3));
        let result = cmd.apply(&doc, &sel).unwrap();
        assert_eq!(result.doc.children().len(), 1);
        assert_eq!(result.doc.plain_text(), "one");
    }

    #[test]
    fn test_delete_everything_leaves_empty_paragraph() {
        let doc = one_para("x");
        let cmd = DeleteRange::new(Position::new(vec![], 0), Position::new(vec![], 1));
        let result = cmd.apply(&doc, &Selection::doc_start()).unwrap();
        assert_eq!(result.doc.children().len(), 1);
        assert_eq!(
            result.doc.children()[0].node_type(),
            NodeType::Paragraph
        );
    }

    #[test]
    fn test_delete_inline_range_across_runs() {
        let doc = Document::from_blocks(vec![Node::paragraph(vec![
            Node::text("abc"),
            Node::text_with_marks("def", vec![doc_model::Mark::Bold]),
            Node::text("ghi"),
        ])]);
        let sel = Selection::doc_start();
        let cmd = DeleteRange::new(Position::new(vec![0, 0], 2), Position::new(vec![0, 2], 1));
        let result = cmd.apply(&doc, &sel).unwrap();
        assert_eq!(result.doc.plain_text(), "abhi");
        let undone = result.inverse.apply(&result.doc, &result.selection).unwrap();
        assert_eq!(undone.doc, doc);
    }

    #[test]
    fn test_delete_cross_block_inline_not_applicable() {
        let doc = Document::from_blocks(vec![
            Node::paragraph(vec![Node::text("one")]),
            Node::paragraph(vec![Node::text("two")]),
        ]);
        let cmd = DeleteRange::new(Position::new(vec![0, 0], 1), Position::new(vec![1, 0], 1));
        let err = cmd.apply(&doc, &Selection::doc_start()).unwrap_err();
        assert!(err.is_not_applicable());
    }

    #[test]
    fn test_insert_node_after_caret_block() {
        let doc = Document::from_blocks(vec![
            Node::paragraph(vec![Node::text("a")]),
            Node::paragraph(vec![Node::text("b")]),
        ]);
        let sel = Selection::caret(Position::new(vec![0, 0], 1));
        let cmd = InsertNode::new(Node::horizontal_rule());
        let result = cmd.apply(&doc, &sel).unwrap();
        assert_eq!(
            result.doc.children()[1].node_type(),
            NodeType::HorizontalRule
        );
    }

    #[test]
    fn test_insert_node_rejects_inline() {
        let doc = Document::with_empty_paragraph();
        let cmd = InsertNode::new(Node::text("stray"));
        assert!(matches!(
            cmd.apply(&doc, &Selection::doc_start()),
            Err(EditError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_set_block_type_heading_and_back() {
        let doc = one_para("Title");
        let sel = Selection::caret(Position::new(vec![0, 0], 0));
        let result = SetBlockType::new(BlockKind::Heading(2))
            .apply(&doc, &sel)
            .unwrap();
        let block = &result.doc.children()[0];
        assert_eq!(block.node_type(), NodeType::Heading);
        assert_eq!(block.int_attr(doc_model::attrs::LEVEL, 0), 2);

        let undone = result.inverse.apply(&result.doc, &result.selection).unwrap();
        assert_eq!(undone.doc, doc);
    }

    #[test]
    fn test_set_block_type_code_block_flattens_marks() {
        let doc = Document::from_blocks(vec![Node::paragraph(vec![
            Node::text("let "),
            Node::text_with_marks("x", vec![doc_model::Mark::Bold]),
        ])]);
        let sel = Selection::caret(Position::new(vec![0, 0], 0));
        let result = SetBlockType::new(BlockKind::CodeBlock)
            .apply(&doc, &sel)
            .unwrap();
        let block = &result.doc.children()[0];
        assert_eq!(block.node_type(), NodeType::CodeBlock);
        assert_eq!(block.children().len(), 1);
        assert!(block.children()[0].marks().is_empty());
        assert_eq!(block.plain_text(), "let x");
    }

    #[test]
    fn test_insert_placeholder_splits_run() {
        let doc = one_para("Dear ,");
        let sel = Selection::caret(Position::new(vec![0, 0], 5));
        let result = InsertPlaceholder::new("client_name")
            .apply(&doc, &sel)
            .unwrap();
        let para = &result.doc.children()[0];
        assert_eq!(para.children().len(), 3);
        assert_eq!(para.children()[1].text_content(), "{{client_name}}");
        assert!(para.children()[1].has_mark(MarkType::Placeholder));
        assert_eq!(result.doc.plain_text(), "Dear {{client_name}},");
    }

    #[test]
    fn test_insert_placeholder_rejects_bad_key() {
        let doc = one_para("x");
        let sel = Selection::caret(Position::new(vec![0, 0], 0));
        assert!(matches!(
            InsertPlaceholder::new("a}b").apply(&doc, &sel),
            Err(EditError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_replace_content() {
        let doc = one_para("old");
        let next = one_para("new");
        let result = ReplaceContent::new(next.clone())
            .apply(&doc, &Selection::doc_start())
            .unwrap();
        assert_eq!(result.doc, next);
        let undone = result.inverse.apply(&result.doc, &result.selection).unwrap();
        assert_eq!(undone.doc, doc);
    }
}
