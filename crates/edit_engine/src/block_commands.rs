//! Blockquote and list structure commands

use crate::{Command, CommandResult, EditError, RestoreContent, Result};
use doc_model::{Document, Node, NodeType, Position, Selection};

fn list_type(node: &Node) -> Option<NodeType> {
    match node.node_type() {
        NodeType::BulletList | NodeType::OrderedList => Some(node.node_type()),
        _ => None,
    }
}

// =============================================================================
// Blockquote
// =============================================================================

/// Wrap the caret's top-level block in a blockquote
#[derive(Debug, Clone)]
pub struct WrapInBlockquote;

impl Command for WrapInBlockquote {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let index = *selection.head.path.first().ok_or_else(|| {
            EditError::NotApplicable("caret is not inside a block".to_string())
        })?;
        let block = doc.try_node_at(&[index])?;
        if !NodeType::Blockquote.allows_child(block.node_type()) {
            return Err(EditError::NotApplicable(format!(
                "{:?} cannot be quoted",
                block.node_type()
            )));
        }

        let mut new_doc = doc.clone();
        let inner = new_doc.children_mut().remove(index);
        new_doc
            .children_mut()
            .insert(index, Node::blockquote(vec![inner]));

        // The old path gains one level under the new blockquote.
        let mut head_path = vec![index, 0];
        head_path.extend_from_slice(&selection.head.path[1..]);
        let caret = Selection::caret(Position::new(head_path, selection.head.offset));

        Ok(CommandResult {
            doc: new_doc,
            selection: caret,
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Wrap in Blockquote"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Splice the contents of the caret's enclosing blockquote back to the
/// top level
#[derive(Debug, Clone)]
pub struct UnwrapBlockquote;

impl Command for UnwrapBlockquote {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let index = *selection.head.path.first().ok_or_else(|| {
            EditError::NotApplicable("caret is not inside a block".to_string())
        })?;
        let block = doc.try_node_at(&[index])?;
        if block.node_type() != NodeType::Blockquote {
            return Err(EditError::NotApplicable(
                "caret is not inside a blockquote".to_string(),
            ));
        }

        let mut new_doc = doc.clone();
        let quote = new_doc.children_mut().remove(index);
        for (i, child) in quote.children().iter().enumerate() {
            new_doc.children_mut().insert(index + i, child.clone());
        }

        // Drop the blockquote level from the caret path.
        let caret = if selection.head.path.len() >= 2 {
            let mut head_path = vec![index + selection.head.path[1]];
            head_path.extend_from_slice(&selection.head.path[2..]);
            Selection::caret(Position::new(head_path, selection.head.offset))
        } else {
            Selection::caret(Position::new(vec![], index))
        };

        Ok(CommandResult {
            doc: new_doc,
            selection: caret,
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Unwrap Blockquote"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Lists
// =============================================================================

/// Turn the caret's top-level paragraph into a one-item list
#[derive(Debug, Clone)]
pub struct WrapInList {
    pub ordered: bool,
}

impl WrapInList {
    pub fn new(ordered: bool) -> Self {
        Self { ordered }
    }
}

impl Command for WrapInList {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let index = *selection.head.path.first().ok_or_else(|| {
            EditError::NotApplicable("caret is not inside a block".to_string())
        })?;
        let block = doc.try_node_at(&[index])?;
        if block.node_type() != NodeType::Paragraph {
            return Err(EditError::NotApplicable(format!(
                "{:?} cannot become a list item",
                block.node_type()
            )));
        }

        let mut new_doc = doc.clone();
        let para = new_doc.children_mut().remove(index);
        let item = Node::list_item(vec![para]);
        let list = if self.ordered {
            Node::ordered_list(vec![item])
        } else {
            Node::bullet_list(vec![item])
        };
        new_doc.children_mut().insert(index, list);

        let mut head_path = vec![index, 0, 0];
        head_path.extend_from_slice(&selection.head.path[1..]);
        let caret = Selection::caret(Position::new(head_path, selection.head.offset));

        Ok(CommandResult {
            doc: new_doc,
            selection: caret,
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Wrap in List"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Nest the caret's list item under its previous sibling
#[derive(Debug, Clone)]
pub struct SinkListItem;

impl Command for SinkListItem {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let item_path = doc
            .find_ancestor(&selection.head.path, |n| {
                n.node_type() == NodeType::ListItem
            })
            .ok_or_else(|| {
                EditError::NotApplicable("caret is not inside a list item".to_string())
            })?;
        let item_index = item_path[item_path.len() - 1];
        if item_index == 0 {
            return Err(EditError::NotApplicable(
                "first item has no sibling to nest under".to_string(),
            ));
        }
        let list_path = &item_path[..item_path.len() - 1];
        let kind = list_type(doc.try_node_at(list_path)?).ok_or(EditError::InvalidPosition)?;

        let mut new_doc = doc.clone();
        let list = new_doc.try_node_at_mut(list_path)?;
        let item = list.children_mut().remove(item_index);

        let previous = &mut list.children_mut()[item_index - 1];
        // Reuse a trailing nested list of the same kind when present.
        match previous.children_mut().last_mut() {
            Some(tail) if tail.node_type() == kind => tail.children_mut().push(item),
            _ => {
                let nested = match kind {
                    NodeType::OrderedList => Node::ordered_list(vec![item]),
                    _ => Node::bullet_list(vec![item]),
                };
                previous.children_mut().push(nested);
            }
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Sink List Item"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Move the caret's list item one nesting level out
///
/// An item in a nested list becomes a sibling of its parent item; an
/// item in a top-level list leaves the list as plain blocks, splitting
/// the list when it sits in the middle.
#[derive(Debug, Clone)]
pub struct LiftListItem;

impl Command for LiftListItem {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let item_path = doc
            .find_ancestor(&selection.head.path, |n| {
                n.node_type() == NodeType::ListItem
            })
            .ok_or_else(|| {
                EditError::NotApplicable("caret is not inside a list item".to_string())
            })?;
        let item_index = item_path[item_path.len() - 1];
        let list_path = item_path[..item_path.len() - 1].to_vec();

        let mut new_doc = doc.clone();
        let inverse = RestoreContent::snapshot(doc, selection);

        let nested_under_item = list_path.len() >= 2
            && doc
                .node_at(&list_path[..list_path.len() - 1])
                .map(|n| n.node_type() == NodeType::ListItem)
                .unwrap_or(false);

        if nested_under_item {
            // Nested list: the item becomes the next sibling of the parent
            // item in the outer list.
            let nested_list_index = list_path[list_path.len() - 1];
            let parent_item_path = list_path[..list_path.len() - 1].to_vec();
            let parent_item_index = parent_item_path[parent_item_path.len() - 1];
            let outer_list_path = parent_item_path[..parent_item_path.len() - 1].to_vec();

            let list = new_doc.try_node_at_mut(&list_path)?;
            let item = list.children_mut().remove(item_index);
            if list.children().is_empty() {
                let parent_item = new_doc.try_node_at_mut(&parent_item_path)?;
                parent_item.children_mut().remove(nested_list_index);
            }

            let outer_list = new_doc.try_node_at_mut(&outer_list_path)?;
            outer_list
                .children_mut()
                .insert(parent_item_index + 1, item);

            return Ok(CommandResult {
                doc: new_doc,
                selection: Selection::doc_start(),
                inverse,
            });
        }

        // Top-level list: take the item's blocks out of the list. Lists
        // tucked inside cells or blockquotes keep their items.
        if list_path.len() != 1 {
            return Err(EditError::NotApplicable(
                "list is not at the document top level".to_string(),
            ));
        }
        let list_index = list_path[0];
        let list = new_doc.try_node_at_mut(&list_path)?;
        let item = list.children_mut().remove(item_index);
        let tail_items: Vec<Node> = list.children_mut().drain(item_index..).collect();
        let list_kind = list.node_type();
        let list_now_empty = list.children().is_empty();

        let mut insert_at = list_index + 1;
        if list_now_empty {
            new_doc.children_mut().remove(list_index);
            insert_at = list_index;
        }
        for block in item.children() {
            new_doc.children_mut().insert(insert_at, block.clone());
            insert_at += 1;
        }
        if !tail_items.is_empty() {
            let tail = match list_kind {
                NodeType::OrderedList => Node::ordered_list(tail_items),
                _ => Node::bullet_list(tail_items),
            };
            new_doc.children_mut().insert(insert_at, tail);
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(Position::new(vec![], list_index)),
            inverse,
        })
    }

    fn display_name(&self) -> &str {
        "Lift List Item"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}
