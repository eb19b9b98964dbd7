//! Editor session: document state, command execution, and change fanout

use crate::{Command, EditError, Result, UndoManager};
use doc_model::{Document, Selection};

/// Outcome of handing a command to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The command ran and the document changed
    Yes,
    /// The command's preconditions did not hold; nothing changed
    No,
}

type Subscriber = Box<dyn FnMut(&Document) + Send>;

/// The main editing session that owns document state and executes
/// commands against it
///
/// Commands that report `NotApplicable` leave the document, selection,
/// and undo history untouched and come back as [`Applied::No`].
pub struct EditorSession {
    /// Current document
    doc: Document,
    /// Current selection
    selection: Selection,
    /// Undo manager
    undo_manager: UndoManager,
    /// Change listeners, notified after every state swap
    subscribers: Vec<Subscriber>,
}

impl EditorSession {
    /// Create a session over the minimal empty document
    pub fn new() -> Self {
        Self::with_document(Document::with_empty_paragraph())
    }

    /// Create a session over an existing document
    pub fn with_document(doc: Document) -> Self {
        Self {
            doc,
            selection: Selection::doc_start(),
            undo_manager: UndoManager::new(),
            subscribers: Vec::new(),
        }
    }

    /// Get the current document
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Get the current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Set the selection
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Register a listener called with the document after each change
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Document) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Execute a command
    ///
    /// `NotApplicable` is a clean no-op; every other error propagates.
    pub fn apply(&mut self, command: Box<dyn Command>) -> Result<Applied> {
        let name = command.display_name().to_string();
        match command.apply(&self.doc, &self.selection) {
            Ok(result) => {
                self.undo_manager.push(command, result.inverse);
                self.doc = result.doc;
                self.selection = result.selection;
                self.notify();
                tracing::debug!(command = %name, "command applied");
                Ok(Applied::Yes)
            }
            Err(err) if err.is_not_applicable() => {
                tracing::debug!(command = %name, reason = %err, "command skipped");
                Ok(Applied::No)
            }
            Err(err) => {
                tracing::warn!(command = %name, error = %err, "command failed");
                Err(err)
            }
        }
    }

    /// Undo the last command
    pub fn undo(&mut self) -> Result<()> {
        let inverse = self.undo_manager.pop_undo()?;
        let result = inverse.apply(&self.doc, &self.selection)?;
        self.doc = result.doc;
        self.selection = result.selection;
        self.notify();
        Ok(())
    }

    /// Redo the last undone command
    pub fn redo(&mut self) -> Result<()> {
        let command = self.undo_manager.pop_redo()?;
        let result = command.apply(&self.doc, &self.selection)?;
        self.doc = result.doc;
        self.selection = result.selection;
        self.notify();
        Ok(())
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.undo_manager.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.undo_manager.can_redo()
    }

    /// Replace the document wholesale and drop history (proposal load)
    pub fn reset(&mut self, doc: Document) -> Result<()> {
        doc.validate().map_err(EditError::DocModel)?;
        self.doc = doc;
        self.selection = Selection::doc_start();
        self.undo_manager.clear();
        self.notify();
        Ok(())
    }

    fn notify(&mut self) {
        for subscriber in &mut self.subscribers {
            subscriber(&self.doc);
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
