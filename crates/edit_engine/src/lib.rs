//! Editing engine for the proposal document model
//!
//! Commands are pure transforms over `(Document, Selection)` pairs; the
//! [`EditorSession`] executes them, records inverses for undo, and fans
//! out change notifications. Table transforms, page arithmetic, and
//! placeholder insertion all live here.

pub mod block_commands;
pub mod command;
pub mod content_commands;
pub mod error;
pub mod mark_commands;
pub mod page_commands;
pub mod pagination;
pub mod session;
pub mod table_commands;
pub mod undo;

pub use block_commands::{LiftListItem, SinkListItem, UnwrapBlockquote, WrapInBlockquote, WrapInList};
pub use command::{Command, CommandResult, RestoreContent};
pub use content_commands::{
    BlockKind, DeleteRange, InsertNode, InsertPlaceholder, InsertText, ReplaceContent,
    SetBlockType,
};
pub(crate) use content_commands::{enclosing_textblock, top_level_insert_index};
pub use error::{EditError, Result};
pub use mark_commands::{SetNodeAttr, ToggleMark, UnsetNodeAttr};
pub use page_commands::InsertPageBreak;
pub use pagination::{go_to_page, next_page, page_index, previous_page, PageIndex};
pub use session::{Applied, EditorSession};
pub use table_commands::{
    AddColumn, AddRow, DeleteColumn, DeleteRow, DeleteTable, InsertSide, InsertTable, MergeCells,
    SetCellAttr, SplitCell, UnsetCellAttr,
};
pub use undo::UndoManager;
