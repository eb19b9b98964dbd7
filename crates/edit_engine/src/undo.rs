//! Undo/redo manager with command batching

use crate::{Command, EditError, Result};
use std::time::{Duration, Instant};

/// An entry in the undo stack
struct UndoEntry {
    /// The original command
    command: Box<dyn Command>,
    /// The inverse command (for undo)
    inverse: Box<dyn Command>,
    /// When this entry was created
    timestamp: Instant,
}

/// Manages undo and redo stacks
pub struct UndoManager {
    /// Stack of commands that can be undone
    undo_stack: Vec<UndoEntry>,
    /// Stack of commands that can be redone, paired with their inverses
    redo_stack: Vec<(Box<dyn Command>, Box<dyn Command>)>,
    /// Maximum number of undo entries
    max_entries: usize,
    /// Time threshold for batching (commands within this time are merged)
    batch_threshold: Duration,
}

impl UndoManager {
    /// Create a new undo manager
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: 100,
            batch_threshold: Duration::from_millis(500),
        }
    }

    /// Create with custom limits
    pub fn with_limits(max_entries: usize, batch_threshold: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries,
            batch_threshold,
        }
    }

    /// Push a command onto the undo stack
    pub fn push(&mut self, command: Box<dyn Command>, inverse: Box<dyn Command>) {
        // Clear redo stack on new command
        self.redo_stack.clear();

        let now = Instant::now();

        // Try to merge with the previous command if within batch threshold
        if let Some(last) = self.undo_stack.last_mut() {
            if now.duration_since(last.timestamp) < self.batch_threshold {
                if let Some(merged) = last.command.merge_with(command.as_ref()) {
                    // The stored inverse only covers the first command in
                    // the batch; the merged entry needs one spanning the
                    // whole merged extent.
                    if let Some(inverse) = merged.as_insert_text().map(|i| i.inverted()) {
                        last.command = merged;
                        last.inverse = inverse;
                        last.timestamp = now;
                        return;
                    }
                }
            }
        }

        self.undo_stack.push(UndoEntry {
            command,
            inverse,
            timestamp: now,
        });

        // Enforce max entries
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last command for undo; the entry moves to the redo stack
    pub fn pop_undo(&mut self) -> Result<Box<dyn Command>> {
        let entry = self.undo_stack.pop().ok_or(EditError::UndoStackEmpty)?;
        let inverse = entry.inverse.clone_box();
        self.redo_stack.push((entry.command, entry.inverse));
        Ok(inverse)
    }

    /// Pop a command for redo; the entry moves back to the undo stack
    pub fn pop_redo(&mut self) -> Result<Box<dyn Command>> {
        let (command, inverse) = self.redo_stack.pop().ok_or(EditError::RedoStackEmpty)?;
        let replay = command.clone_box();
        self.undo_stack.push(UndoEntry {
            command,
            inverse,
            timestamp: Instant::now(),
        });
        Ok(replay)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InsertText;
    use doc_model::Position;

    fn insert(offset: usize, text: &str) -> Box<dyn Command> {
        Box::new(InsertText::new(Position::new(vec![0, 0], offset), text))
    }

    #[test]
    fn test_push_then_undo_redo() {
        let mut undo = UndoManager::new();
        assert!(!undo.can_undo());
        undo.push(insert(0, "a"), insert(0, "placeholder-inverse"));
        assert!(undo.can_undo());
        assert!(!undo.can_redo());

        undo.pop_undo().unwrap();
        assert!(!undo.can_undo());
        assert!(undo.can_redo());

        undo.pop_redo().unwrap();
        assert!(undo.can_undo());
        assert!(!undo.can_redo());
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut undo = UndoManager::new();
        undo.push(insert(0, "a"), insert(0, "i"));
        undo.pop_undo().unwrap();
        assert!(undo.can_redo());
        undo.push(insert(0, "b"), insert(0, "i"));
        assert!(!undo.can_redo());
    }

    #[test]
    fn test_sequential_inserts_merge() {
        let mut undo = UndoManager::new();
        undo.push(insert(0, "ab"), insert(0, "i"));
        undo.push(insert(2, "cd"), insert(0, "i"));
        // Merged into one entry: a single undo drains the stack.
        undo.pop_undo().unwrap();
        assert!(!undo.can_undo());
    }

    #[test]
    fn test_max_entries_drops_oldest() {
        let mut undo = UndoManager::with_limits(2, Duration::ZERO);
        undo.push(insert(0, "a"), insert(0, "i"));
        undo.push(insert(5, "b"), insert(0, "i"));
        undo.push(insert(9, "c"), insert(0, "i"));
        undo.pop_undo().unwrap();
        undo.pop_undo().unwrap();
        assert!(undo.pop_undo().is_err());
    }
}
