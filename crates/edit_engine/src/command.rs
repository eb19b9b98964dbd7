//! Command system for document editing
//!
//! Every edit is a [`Command`]: a pure function from (document, selection)
//! to a new document, a new selection, and an inverse command. Commands
//! never mutate their input; the session swaps the new state in only when
//! apply succeeds, so a failed command leaves the document untouched.

use doc_model::{Document, Selection};

/// Result of applying a command
#[derive(Debug)]
pub struct CommandResult {
    /// The new document after the command
    pub doc: Document,
    /// The new selection after the command
    pub selection: Selection,
    /// The inverse command (for undo)
    pub inverse: Box<dyn Command>,
}

/// Trait for all editing commands
pub trait Command: std::fmt::Debug + Send + Sync {
    /// Apply this command to a document
    fn apply(&self, doc: &Document, selection: &Selection) -> crate::Result<CommandResult>;

    /// Try to merge this command with a later one (for undo batching)
    fn merge_with(&self, _other: &dyn Command) -> Option<Box<dyn Command>> {
        None
    }

    /// Downcast hook used by text-insertion batching
    fn as_insert_text(&self) -> Option<&crate::InsertText> {
        None
    }

    /// Get a display name for this command
    fn display_name(&self) -> &str;

    /// Clone this command into a box
    fn clone_box(&self) -> Box<dyn Command>;
}

/// Inverse used by structural commands: restore a prior document and
/// selection wholesale
///
/// Table and block transforms change too much shape for a precise
/// inverse to pay its way; snapshotting the subtree before the edit is
/// exact and cheap at document scale.
#[derive(Debug, Clone)]
pub struct RestoreContent {
    pub doc: Document,
    pub selection: Selection,
}

impl RestoreContent {
    pub fn snapshot(doc: &Document, selection: &Selection) -> Box<dyn Command> {
        Box::new(Self {
            doc: doc.clone(),
            selection: selection.clone(),
        })
    }
}

impl Command for RestoreContent {
    fn apply(&self, doc: &Document, selection: &Selection) -> crate::Result<CommandResult> {
        Ok(CommandResult {
            doc: self.doc.clone(),
            selection: self.selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Restore"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::Node;

    #[test]
    fn test_restore_swaps_states() {
        let before = Document::with_empty_paragraph();
        let after = Document::from_blocks(vec![Node::paragraph(vec![Node::text("hi")])]);
        let sel = Selection::doc_start();

        let restore = RestoreContent {
            doc: before.clone(),
            selection: sel.clone(),
        };
        let result = restore.apply(&after, &sel).unwrap();
        assert_eq!(result.doc, before);

        let back = result.inverse.apply(&result.doc, &result.selection).unwrap();
        assert_eq!(back.doc, after);
    }
}
