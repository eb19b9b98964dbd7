//! Mark toggling and node attribute commands

use crate::{
    enclosing_textblock, Command, CommandResult, EditError, RestoreContent, Result,
};
use doc_model::{
    attrs, grapheme_byte_offset, is_valid_color, is_valid_url, AttrValue, Document, Mark,
    MarkType, Node, NodeType, Selection,
};

fn validate_mark(mark: &Mark) -> Result<()> {
    match mark {
        Mark::TextColor { color } | Mark::Highlight { color } => {
            if !is_valid_color(color) {
                return Err(EditError::InvalidInput(format!(
                    "invalid color {color:?}"
                )));
            }
        }
        Mark::Link { href } => {
            if !is_valid_url(href) {
                return Err(EditError::InvalidInput(format!("invalid url {href:?}")));
            }
        }
        _ => {}
    }
    Ok(())
}

/// A position normalized to (child index, grapheme offset) within a
/// textblock
fn normalize_in_block(
    doc: &Document,
    path: &[usize],
    offset: usize,
) -> Option<(Vec<usize>, usize, usize)> {
    let node = doc.node_at(path)?;
    match node.node_type() {
        NodeType::Text => {
            let (parent, child) = path.split_at(path.len() - 1);
            Some((parent.to_vec(), child[0], offset))
        }
        t if t.is_textblock() => Some((path.to_vec(), offset, 0)),
        _ => None,
    }
}

/// Split the run at `child` so that grapheme `offset` becomes a run
/// boundary; returns the child index of that boundary
fn split_run(block: &mut Node, child: usize, offset: usize) -> usize {
    if child >= block.children().len() {
        return block.children().len();
    }
    let run = &block.children()[child];
    if run.node_type() != NodeType::Text {
        return if offset == 0 { child } else { child + 1 };
    }
    let len = run.text_len();
    if offset == 0 {
        return child;
    }
    if offset >= len {
        return child + 1;
    }
    let byte = grapheme_byte_offset(run.text_content(), offset);
    let (before, after) = {
        let t = run.text_content();
        (t[..byte].to_string(), t[byte..].to_string())
    };
    let marks = run.marks().to_vec();
    block.children_mut()[child] = Node::text_with_marks(before, marks.clone());
    block
        .children_mut()
        .insert(child + 1, Node::text_with_marks(after, marks));
    child + 1
}

// =============================================================================
// ToggleMark
// =============================================================================

/// Toggle a mark over the selection
///
/// A caret toggles the whole enclosing textblock. When every covered run
/// already carries the mark type it is removed; otherwise the mark is
/// applied everywhere, splitting runs at the selection boundaries.
#[derive(Debug, Clone)]
pub struct ToggleMark {
    pub mark: Mark,
}

impl ToggleMark {
    pub fn new(mark: Mark) -> Self {
        Self { mark }
    }
}

impl Command for ToggleMark {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        validate_mark(&self.mark)?;
        let mark_type = self.mark.mark_type();

        let start = selection.start();
        let end = selection.end();
        let mut new_doc = doc.clone();

        let (block_path, from, to) = if selection.is_caret() {
            let block_path = enclosing_textblock(doc, &start.path).ok_or_else(|| {
                EditError::NotApplicable("caret is not inside a textblock".to_string())
            })?;
            let count = doc.try_node_at(&block_path)?.children().len();
            (block_path, 0, count)
        } else {
            let (p1, c1, o1) =
                normalize_in_block(doc, &start.path, start.offset).ok_or_else(|| {
                    EditError::NotApplicable("selection is not inline".to_string())
                })?;
            let (p2, c2, o2) =
                normalize_in_block(doc, &end.path, end.offset).ok_or_else(|| {
                    EditError::NotApplicable("selection is not inline".to_string())
                })?;
            if p1 != p2 {
                return Err(EditError::NotApplicable(
                    "selection crosses block boundaries".to_string(),
                ));
            }
            let block = new_doc.try_node_at_mut(&p1)?;
            // Split the end first so the start indices stay valid, then
            // account for the extra run a start split inserts before `to`.
            let to = split_run(block, c2, o2);
            let before_start_split = block.children().len();
            let from = split_run(block, c1, o1);
            let to = to + (block.children().len() - before_start_split);
            if from >= to {
                return Err(EditError::NotApplicable("empty selection".to_string()));
            }
            (p1, from, to)
        };

        let block = new_doc.try_node_at_mut(&block_path)?;
        let covered: Vec<usize> = (from..to.min(block.children().len()))
            .filter(|&i| block.children()[i].node_type() == NodeType::Text)
            .collect();
        if covered.is_empty() {
            return Err(EditError::NotApplicable(
                "no text in the selection".to_string(),
            ));
        }

        let all_marked = covered
            .iter()
            .all(|&i| block.children()[i].has_mark(mark_type));
        for &i in &covered {
            let run = &mut block.children_mut()[i];
            if all_marked {
                run.remove_mark(mark_type);
            } else {
                run.add_mark(self.mark.clone());
            }
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Toggle Mark"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Node attribute commands
// =============================================================================

/// Set one attribute on the node at a path, with a precise inverse
#[derive(Debug, Clone)]
pub struct SetNodeAttr {
    pub path: Vec<usize>,
    pub name: String,
    pub value: AttrValue,
}

impl SetNodeAttr {
    pub fn new(path: Vec<usize>, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            path,
            name: name.into(),
            value: value.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self.name.as_str() {
            attrs::BACKGROUND_COLOR | attrs::TEXT_COLOR => {
                let color = self.value.as_str().unwrap_or("");
                if !is_valid_color(color) {
                    return Err(EditError::InvalidInput(format!(
                        "invalid color {color:?}"
                    )));
                }
            }
            attrs::SRC => {
                let url = self.value.as_str().unwrap_or("");
                if !is_valid_url(url) {
                    return Err(EditError::InvalidInput(format!("invalid url {url:?}")));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Command for SetNodeAttr {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        self.validate()?;
        let mut new_doc = doc.clone();
        let node = new_doc.try_node_at_mut(&self.path)?;
        let previous = node.attr(&self.name).cloned();
        node.set_attr(self.name.clone(), self.value.clone());

        let inverse: Box<dyn Command> = match previous {
            Some(value) => Box::new(SetNodeAttr::new(self.path.clone(), self.name.clone(), value)),
            None => Box::new(UnsetNodeAttr::new(self.path.clone(), self.name.clone())),
        };

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse,
        })
    }

    fn display_name(&self) -> &str {
        "Set Attribute"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Remove one attribute from the node at a path
#[derive(Debug, Clone)]
pub struct UnsetNodeAttr {
    pub path: Vec<usize>,
    pub name: String,
}

impl UnsetNodeAttr {
    pub fn new(path: Vec<usize>, name: impl Into<String>) -> Self {
        Self {
            path,
            name: name.into(),
        }
    }
}

impl Command for UnsetNodeAttr {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let mut new_doc = doc.clone();
        let node = new_doc.try_node_at_mut(&self.path)?;
        let previous = node.unset_attr(&self.name).ok_or_else(|| {
            EditError::NotApplicable(format!("attribute {:?} is not set", self.name))
        })?;

        let inverse = Box::new(SetNodeAttr::new(
            self.path.clone(),
            self.name.clone(),
            previous,
        ));

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse,
        })
    }

    fn display_name(&self) -> &str {
        "Unset Attribute"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}
