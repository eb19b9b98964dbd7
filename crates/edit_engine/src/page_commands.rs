//! Explicit page break insertion

use crate::{top_level_insert_index, Command, CommandResult, EditError, RestoreContent, Result};
use doc_model::{Document, Node, NodeType, Position, Selection};

/// Insert a page break after the caret's top-level block
///
/// Page breaks live only at the top level; a caret inside a table cell
/// or list item cannot take one.
#[derive(Debug, Clone)]
pub struct InsertPageBreak;

impl Command for InsertPageBreak {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let chain = doc.type_chain(&selection.head.path);
        if chain.iter().any(|t| {
            matches!(
                t,
                NodeType::TableCell | NodeType::TableHeaderCell | NodeType::ListItem
            )
        }) {
            return Err(EditError::NotApplicable(
                "page breaks cannot land inside cells or list items".to_string(),
            ));
        }

        let mut new_doc = doc.clone();
        let at = top_level_insert_index(&selection.head).min(new_doc.children().len());
        new_doc.children_mut().insert(at, Node::page_break());

        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(Position::new(vec![], at + 1)),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Insert Page Break"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}
