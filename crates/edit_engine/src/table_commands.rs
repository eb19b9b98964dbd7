//! Table structure commands
//!
//! All table transforms work in grid coordinates via [`GridMap`], then
//! translate back to tree indices. Preconditions that do not hold at the
//! current selection surface as `NotApplicable`, which the session turns
//! into a no-op; structural inverses are whole-state snapshots.

use crate::{
    top_level_insert_index, Command, CommandResult, EditError, RestoreContent, Result,
};
use doc_model::{
    attrs, col_span, is_valid_color, row_span, AttrValue, CellRef, Document, GridMap, Node,
    NodeType, Position, Selection,
};

/// Where the caret sits inside a table
#[derive(Debug, Clone)]
pub(crate) struct TableCtx {
    pub table_path: Vec<usize>,
    /// Tree index of the enclosing row
    pub row: usize,
    /// Tree index of the enclosing cell within its row
    pub cell: usize,
}

pub(crate) fn enclosing_table(doc: &Document, pos: &Position) -> Option<TableCtx> {
    let table_path = doc.find_ancestor(&pos.path, |n| n.node_type() == NodeType::Table)?;
    let depth = table_path.len();
    if pos.path.len() < depth + 2 {
        return None;
    }
    Some(TableCtx {
        row: pos.path[depth],
        cell: pos.path[depth + 1],
        table_path,
    })
}

fn require_table_ctx(doc: &Document, selection: &Selection) -> Result<TableCtx> {
    enclosing_table(doc, &selection.head).ok_or_else(|| {
        EditError::NotApplicable("caret is not inside a table cell".to_string())
    })
}

fn build_grid(table: &Node) -> Result<GridMap> {
    GridMap::build(table).map_err(EditError::DocModel)
}

fn fresh_cell(node_type: NodeType) -> Node {
    match node_type {
        NodeType::TableHeaderCell => Node::table_header_cell(vec![]),
        _ => Node::table_cell(vec![]),
    }
}

fn cell_node<'a>(table: &'a Node, cell: CellRef) -> &'a Node {
    &table.children()[cell.row].children()[cell.cell]
}

/// Tree insertion index in row `row` for a cell whose grid column is
/// `col`: the number of cells already in that row originating left of it
fn tree_index_for_column(grid: &GridMap, table: &Node, row: usize, col: usize) -> usize {
    let mut index = 0;
    for i in 0..table.children()[row].children().len() {
        match grid.origin(CellRef { row, cell: i }) {
            Some((_, c)) if c < col => index += 1,
            _ => {}
        }
    }
    index
}

fn set_span(cell: &mut Node, attr: &str, value: usize) {
    if value <= 1 {
        cell.unset_attr(attr);
    } else {
        cell.set_attr(attr, value as i64);
    }
}

/// Caret placed in the first paragraph of the cell at tree (row, cell)
fn caret_in_cell(table_path: &[usize], row: usize, cell: usize) -> Selection {
    let mut path = table_path.to_vec();
    path.extend_from_slice(&[row, cell, 0]);
    Selection::caret(Position::new(path, 0))
}

// =============================================================================
// InsertTable
// =============================================================================

/// Insert a fresh table after the caret's top-level block
#[derive(Debug, Clone)]
pub struct InsertTable {
    pub rows: usize,
    pub cols: usize,
    pub with_header_row: bool,
}

impl InsertTable {
    pub fn new(rows: usize, cols: usize, with_header_row: bool) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
            with_header_row,
        }
    }
}

impl Command for InsertTable {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        if enclosing_table(doc, &selection.head).is_some() {
            return Err(EditError::NotApplicable(
                "tables do not nest".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(self.rows);
        for r in 0..self.rows {
            let header = self.with_header_row && r == 0;
            let cells = (0..self.cols)
                .map(|_| {
                    if header {
                        Node::table_header_cell(vec![])
                    } else {
                        Node::table_cell(vec![])
                    }
                })
                .collect();
            rows.push(Node::table_row(cells));
        }

        let mut new_doc = doc.clone();
        let at = top_level_insert_index(&selection.head).min(new_doc.children().len());
        new_doc.children_mut().insert(at, Node::table(rows));

        Ok(CommandResult {
            doc: new_doc,
            selection: caret_in_cell(&[at], 0, 0),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Insert Table"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// AddRow
// =============================================================================

/// Which side of the caret's cell a new row or column lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertSide {
    Before,
    After,
}

/// Insert a row adjacent to the caret's cell
///
/// A cell whose rowspan crosses the new boundary grows by one row
/// instead of being split; every other grid column gets a fresh cell.
#[derive(Debug, Clone)]
pub struct AddRow {
    pub side: InsertSide,
}

impl AddRow {
    pub fn new(side: InsertSide) -> Self {
        Self { side }
    }
}

impl Command for AddRow {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let ctx = require_table_ctx(doc, selection)?;
        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&ctx.table_path)?;
        let grid = build_grid(table)?;

        let this = CellRef {
            row: ctx.row,
            cell: ctx.cell,
        };
        let (r0, _) = grid.origin(this).ok_or(EditError::InvalidPosition)?;
        let h = row_span(cell_node(table, this));
        let boundary = match self.side {
            InsertSide::Before => r0,
            InsertSide::After => r0 + h,
        };

        let mut grown: Vec<CellRef> = Vec::new();
        let mut new_cells = Vec::new();
        for c in 0..grid.cols() {
            let above = boundary.checked_sub(1).and_then(|r| grid.owner(r, c));
            let below = if boundary < grid.rows() {
                grid.owner(boundary, c)
            } else {
                None
            };
            if let (Some(a), Some(b)) = (above, below) {
                if a == b {
                    // Spans the boundary: grow it instead of splitting.
                    if !grown.contains(&a) {
                        grown.push(a);
                    }
                    continue;
                }
            }
            let template = above.or(below).map(|r| cell_node(table, r).node_type());
            new_cells.push(fresh_cell(template.unwrap_or(NodeType::TableCell)));
        }

        for cell_ref in grown {
            let cell = &mut table.children_mut()[cell_ref.row].children_mut()[cell_ref.cell];
            let spans = row_span(cell) + 1;
            set_span(cell, attrs::ROWSPAN, spans);
        }
        table
            .children_mut()
            .insert(boundary, Node::table_row(new_cells));

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Add Row"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// AddColumn
// =============================================================================

/// Insert a column adjacent to the caret's cell
#[derive(Debug, Clone)]
pub struct AddColumn {
    pub side: InsertSide,
}

impl AddColumn {
    pub fn new(side: InsertSide) -> Self {
        Self { side }
    }
}

impl Command for AddColumn {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let ctx = require_table_ctx(doc, selection)?;
        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&ctx.table_path)?;
        let grid = build_grid(table)?;

        let this = CellRef {
            row: ctx.row,
            cell: ctx.cell,
        };
        let (_, c0) = grid.origin(this).ok_or(EditError::InvalidPosition)?;
        let w = col_span(cell_node(table, this));
        let boundary = match self.side {
            InsertSide::Before => c0,
            InsertSide::After => c0 + w,
        };

        let mut grown: Vec<CellRef> = Vec::new();
        let mut fresh: Vec<(usize, usize, NodeType)> = Vec::new();
        for r in 0..grid.rows() {
            let left = boundary.checked_sub(1).and_then(|c| grid.owner(r, c));
            let right = if boundary < grid.cols() {
                grid.owner(r, boundary)
            } else {
                None
            };
            if let (Some(l), Some(rt)) = (left, right) {
                if l == rt {
                    if !grown.contains(&l) {
                        grown.push(l);
                    }
                    continue;
                }
            }
            // A rowspan neighbor covers several grid rows; only its own tr
            // takes the fresh cell for each covered row.
            let template = left
                .or(right)
                .map(|cr| cell_node(table, cr).node_type())
                .unwrap_or(NodeType::TableCell);
            let at = tree_index_for_column(&grid, table, r, boundary);
            fresh.push((r, at, template));
        }

        for cell_ref in grown {
            let cell = &mut table.children_mut()[cell_ref.row].children_mut()[cell_ref.cell];
            let spans = col_span(cell) + 1;
            set_span(cell, attrs::COLSPAN, spans);
        }
        for (r, at, template) in fresh {
            table.children_mut()[r]
                .children_mut()
                .insert(at, fresh_cell(template));
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Add Column"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// DeleteRow / DeleteColumn / DeleteTable
// =============================================================================

/// Delete the grid row under the caret; deleting the last row removes
/// the table
#[derive(Debug, Clone)]
pub struct DeleteRow;

impl Command for DeleteRow {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let ctx = require_table_ctx(doc, selection)?;
        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&ctx.table_path)?;
        let grid = build_grid(table)?;

        if grid.rows() == 1 {
            return DeleteTable.apply(doc, selection);
        }
        let r0 = ctx.row;

        // Owners intersecting the doomed grid row, in tree order.
        let mut owners: Vec<CellRef> = Vec::new();
        for c in 0..grid.cols() {
            if let Some(owner) = grid.owner(r0, c) {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }

        // Remainders of cells originating in this row move into the next
        // row; insert them right-to-left so earlier indices stay valid.
        let mut carried: Vec<(usize, Node)> = Vec::new();
        for &owner in &owners {
            let h = row_span(cell_node(table, owner));
            if owner.row == r0 && h > 1 {
                let (_, col) = grid.origin(owner).ok_or(EditError::InvalidPosition)?;
                let mut moved = cell_node(table, owner).clone();
                set_span(&mut moved, attrs::ROWSPAN, h - 1);
                let at = tree_index_for_column(&grid, table, r0 + 1, col);
                carried.push((at, moved));
            } else if owner.row < r0 {
                let cell = &mut table.children_mut()[owner.row].children_mut()[owner.cell];
                let spans = row_span(cell) - 1;
                set_span(cell, attrs::ROWSPAN, spans);
            }
        }
        carried.sort_by(|a, b| b.0.cmp(&a.0));
        for (at, cell) in carried {
            table.children_mut()[r0 + 1].children_mut().insert(at, cell);
        }
        table.children_mut().remove(r0);

        let caret_row = r0.min(table.children().len() - 1);
        Ok(CommandResult {
            doc: new_doc,
            selection: caret_in_cell(&ctx.table_path, caret_row, 0),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Delete Row"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Delete the grid column under the caret; deleting the last column
/// removes the table
#[derive(Debug, Clone)]
pub struct DeleteColumn;

impl Command for DeleteColumn {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let ctx = require_table_ctx(doc, selection)?;
        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&ctx.table_path)?;
        let grid = build_grid(table)?;

        if grid.cols() == 1 {
            return DeleteTable.apply(doc, selection);
        }
        let this = CellRef {
            row: ctx.row,
            cell: ctx.cell,
        };
        let (_, c0) = grid.origin(this).ok_or(EditError::InvalidPosition)?;

        let mut owners: Vec<CellRef> = Vec::new();
        for r in 0..grid.rows() {
            if let Some(owner) = grid.owner(r, c0) {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }

        // Remove narrow cells row by row, widest spans just shrink.
        // Within a row, removals run right-to-left by tree index.
        let mut removals: Vec<CellRef> = Vec::new();
        for &owner in &owners {
            let cell = &mut table.children_mut()[owner.row].children_mut()[owner.cell];
            let w = col_span(cell);
            if w > 1 {
                set_span(cell, attrs::COLSPAN, w - 1);
            } else {
                removals.push(owner);
            }
        }
        removals.sort_by(|a, b| b.cell.cmp(&a.cell));
        for owner in removals {
            table.children_mut()[owner.row].children_mut().remove(owner.cell);
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: caret_in_cell(&ctx.table_path, 0, 0),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Delete Column"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Remove the whole table under the caret
#[derive(Debug, Clone)]
pub struct DeleteTable;

impl Command for DeleteTable {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let table_path = doc
            .find_ancestor(&selection.head.path, |n| n.node_type() == NodeType::Table)
            .ok_or_else(|| {
                EditError::NotApplicable("caret is not inside a table".to_string())
            })?;
        // Tables only stand at the top level, so the path is one index.
        let index = table_path[0];

        let mut new_doc = doc.clone();
        new_doc.children_mut().remove(index);
        if new_doc.children().is_empty() {
            new_doc.children_mut().push(Node::empty_paragraph());
        }
        let caret = Selection::caret(Position::new(vec![], index.min(new_doc.children().len())));

        Ok(CommandResult {
            doc: new_doc,
            selection: caret,
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Delete Table"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// MergeCells / SplitCell
// =============================================================================

/// Merge the rectangle of cells spanned by the selection into one cell
///
/// The selection's anchor and head must sit in cells of the same table.
/// Every cell touching the bounding rectangle must lie entirely inside
/// it; a partially covered span rejects the merge.
#[derive(Debug, Clone)]
pub struct MergeCells;

impl Command for MergeCells {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let a = enclosing_table(doc, &selection.anchor).ok_or_else(|| {
            EditError::NotApplicable("selection does not start in a table".to_string())
        })?;
        let b = enclosing_table(doc, &selection.head).ok_or_else(|| {
            EditError::NotApplicable("selection does not end in a table".to_string())
        })?;
        if a.table_path != b.table_path {
            return Err(EditError::NotApplicable(
                "selection spans two tables".to_string(),
            ));
        }
        let ref_a = CellRef {
            row: a.row,
            cell: a.cell,
        };
        let ref_b = CellRef {
            row: b.row,
            cell: b.cell,
        };
        if ref_a == ref_b {
            return Err(EditError::NotApplicable(
                "selection covers a single cell".to_string(),
            ));
        }

        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&a.table_path)?;
        let grid = build_grid(table)?;

        let (ar, ac) = grid.origin(ref_a).ok_or(EditError::InvalidPosition)?;
        let (br, bc) = grid.origin(ref_b).ok_or(EditError::InvalidPosition)?;
        let top = ar.min(br);
        let left = ac.min(bc);
        let bottom = (ar + row_span(cell_node(table, ref_a)) - 1)
            .max(br + row_span(cell_node(table, ref_b)) - 1);
        let right = (ac + col_span(cell_node(table, ref_a)) - 1)
            .max(bc + col_span(cell_node(table, ref_b)) - 1);

        // Every slot in the rectangle must belong to a cell whose own
        // extent stays inside the rectangle.
        let mut members: Vec<CellRef> = Vec::new();
        for r in top..=bottom {
            for c in left..=right {
                let owner = grid.owner(r, c).ok_or(EditError::InvalidPosition)?;
                let (or, oc) = grid.origin(owner).ok_or(EditError::InvalidPosition)?;
                let h = row_span(cell_node(table, owner));
                let w = col_span(cell_node(table, owner));
                if or < top || oc < left || or + h - 1 > bottom || oc + w - 1 > right {
                    return Err(EditError::NotApplicable(
                        "selection cuts through a merged cell".to_string(),
                    ));
                }
                if !members.contains(&owner) {
                    members.push(owner);
                }
            }
        }

        let target = grid.owner(top, left).ok_or(EditError::InvalidPosition)?;

        // Gather content from the absorbed cells, skipping bare empty
        // paragraphs.
        let mut absorbed = Vec::new();
        for &member in &members {
            if member == target {
                continue;
            }
            for block in cell_node(table, member).children() {
                let empty_para = block.node_type() == NodeType::Paragraph
                    && block.children().is_empty();
                if !empty_para {
                    absorbed.push(block.clone());
                }
            }
        }

        {
            let cell = &mut table.children_mut()[target.row].children_mut()[target.cell];
            cell.children_mut().extend(absorbed);
            set_span(cell, attrs::ROWSPAN, bottom - top + 1);
            set_span(cell, attrs::COLSPAN, right - left + 1);
        }

        // Remove absorbed cells back-to-front so indices stay valid.
        let mut doomed: Vec<CellRef> =
            members.into_iter().filter(|&m| m != target).collect();
        doomed.sort_by(|x, y| y.row.cmp(&x.row).then(y.cell.cmp(&x.cell)));
        for cell_ref in doomed {
            table.children_mut()[cell_ref.row]
                .children_mut()
                .remove(cell_ref.cell);
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: caret_in_cell(&a.table_path, target.row, target.cell),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Merge Cells"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Split the merged cell under the caret back into unit cells
///
/// Content stays in the top-left cell; the uncovered slots get fresh
/// empty cells of the same kind.
#[derive(Debug, Clone)]
pub struct SplitCell;

impl Command for SplitCell {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let ctx = require_table_ctx(doc, selection)?;
        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&ctx.table_path)?;
        let grid = build_grid(table)?;

        let this = CellRef {
            row: ctx.row,
            cell: ctx.cell,
        };
        let w = col_span(cell_node(table, this));
        let h = row_span(cell_node(table, this));
        if w == 1 && h == 1 {
            return Err(EditError::NotApplicable("cell is not merged".to_string()));
        }
        let (r0, c0) = grid.origin(this).ok_or(EditError::InvalidPosition)?;
        let kind = cell_node(table, this).node_type();

        {
            let cell = &mut table.children_mut()[this.row].children_mut()[this.cell];
            cell.unset_attr(attrs::COLSPAN);
            cell.unset_attr(attrs::ROWSPAN);
        }

        // Own row: the origin keeps its place, siblings fill the freed
        // columns to its right.
        for i in 1..w {
            table.children_mut()[r0]
                .children_mut()
                .insert(this.cell + i, fresh_cell(kind));
        }
        // Covered rows below get a full run of fresh cells.
        for r in r0 + 1..r0 + h {
            let at = tree_index_for_column(&grid, table, r, c0);
            for i in 0..w {
                table.children_mut()[r]
                    .children_mut()
                    .insert(at + i, fresh_cell(kind));
            }
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: caret_in_cell(&ctx.table_path, this.row, this.cell),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Split Cell"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Cell attribute rectangles
// =============================================================================

/// Set a style attribute on every cell in the selection rectangle
#[derive(Debug, Clone)]
pub struct SetCellAttr {
    pub name: String,
    pub value: AttrValue,
}

impl SetCellAttr {
    pub fn background(color: impl Into<String>) -> Self {
        Self {
            name: attrs::BACKGROUND_COLOR.to_string(),
            value: AttrValue::Str(color.into()),
        }
    }

    pub fn text_color(color: impl Into<String>) -> Self {
        Self {
            name: attrs::TEXT_COLOR.to_string(),
            value: AttrValue::Str(color.into()),
        }
    }
}

/// Distinct cells under the selection rectangle, anchor cell through
/// head cell inclusive
fn selected_cells(doc: &Document, selection: &Selection) -> Result<(Vec<usize>, Vec<CellRef>)> {
    let a = enclosing_table(doc, &selection.anchor).ok_or_else(|| {
        EditError::NotApplicable("selection does not start in a table".to_string())
    })?;
    let b = enclosing_table(doc, &selection.head).ok_or_else(|| {
        EditError::NotApplicable("selection does not end in a table".to_string())
    })?;
    if a.table_path != b.table_path {
        return Err(EditError::NotApplicable(
            "selection spans two tables".to_string(),
        ));
    }
    let table = doc.try_node_at(&a.table_path)?;
    let grid = build_grid(table)?;
    let (ar, ac) = grid
        .origin(CellRef {
            row: a.row,
            cell: a.cell,
        })
        .ok_or(EditError::InvalidPosition)?;
    let (br, bc) = grid
        .origin(CellRef {
            row: b.row,
            cell: b.cell,
        })
        .ok_or(EditError::InvalidPosition)?;
    let cells = grid.cells_in_rect(ar.min(br), ac.min(bc), ar.max(br), ac.max(bc));
    Ok((a.table_path, cells))
}

impl Command for SetCellAttr {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        if matches!(
            self.name.as_str(),
            attrs::BACKGROUND_COLOR | attrs::TEXT_COLOR
        ) {
            let color = self.value.as_str().unwrap_or("");
            if !is_valid_color(color) {
                return Err(EditError::InvalidInput(format!(
                    "invalid color {color:?}"
                )));
            }
        }

        let (table_path, cells) = selected_cells(doc, selection)?;
        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&table_path)?;
        for cell_ref in cells {
            table.children_mut()[cell_ref.row].children_mut()[cell_ref.cell]
                .set_attr(self.name.clone(), self.value.clone());
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Set Cell Attribute"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Clear a style attribute from every cell in the selection rectangle
#[derive(Debug, Clone)]
pub struct UnsetCellAttr {
    pub name: String,
}

impl UnsetCellAttr {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Command for UnsetCellAttr {
    fn apply(&self, doc: &Document, selection: &Selection) -> Result<CommandResult> {
        let (table_path, cells) = selected_cells(doc, selection)?;
        let mut new_doc = doc.clone();
        let table = new_doc.try_node_at_mut(&table_path)?;
        let mut touched = false;
        for cell_ref in cells {
            touched |= table.children_mut()[cell_ref.row].children_mut()[cell_ref.cell]
                .unset_attr(&self.name)
                .is_some();
        }
        if !touched {
            return Err(EditError::NotApplicable(format!(
                "no cell carries {:?}",
                self.name
            )));
        }

        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: RestoreContent::snapshot(doc, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Unset Cell Attribute"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_doc(rows: usize, cols: usize) -> Document {
        let table = Node::table(
            (0..rows)
                .map(|_| Node::table_row((0..cols).map(|_| Node::table_cell(vec![])).collect()))
                .collect(),
        );
        Document::from_blocks(vec![Node::paragraph(vec![Node::text("intro")]), table])
    }

    fn cell_caret(row: usize, cell: usize) -> Selection {
        Selection::caret(Position::new(vec![1, row, cell, 0], 0))
    }

    fn table_of(doc: &Document) -> &Node {
        &doc.children()[1]
    }

    #[test]
    fn test_insert_table_after_caret_block() {
        let doc = Document::from_blocks(vec![Node::paragraph(vec![Node::text("x")])]);
        let sel = Selection::caret(Position::new(vec![0, 0], 1));
        let result = InsertTable::new(3, 3, true).apply(&doc, &sel).unwrap();
        let table = &result.doc.children()[1];
        assert_eq!(table.node_type(), NodeType::Table);
        assert_eq!(table.children().len(), 3);
        assert_eq!(
            table.children()[0].children()[0].node_type(),
            NodeType::TableHeaderCell
        );
        assert_eq!(
            table.children()[1].children()[0].node_type(),
            NodeType::TableCell
        );
        assert_eq!(result.selection.head.path, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_insert_table_inside_table_not_applicable() {
        let doc = table_doc(2, 2);
        let err = InsertTable::new(2, 2, false)
            .apply(&doc, &cell_caret(0, 0))
            .unwrap_err();
        assert!(err.is_not_applicable());
    }

    #[test]
    fn test_insert_table_clamps_dimensions() {
        let cmd = InsertTable::new(0, 0, false);
        assert_eq!(cmd.rows, 1);
        assert_eq!(cmd.cols, 1);
    }

    #[test]
    fn test_add_row_after() {
        let doc = table_doc(2, 3);
        let result = AddRow::new(InsertSide::After)
            .apply(&doc, &cell_caret(0, 1))
            .unwrap();
        let table = table_of(&result.doc);
        assert_eq!(table.children().len(), 3);
        assert_eq!(table.children()[1].children().len(), 3);
        GridMap::build(table).unwrap();
    }

    #[test]
    fn test_add_row_grows_crossing_rowspan() {
        // Column 0 spans both rows; adding a row at the internal boundary
        // grows the span rather than splitting it.
        let mut doc = table_doc(2, 2);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0].set_attr(attrs::ROWSPAN, 2i64);
        table.children_mut()[1].children_mut().remove(0);

        let result = AddRow::new(InsertSide::After)
            .apply(&doc, &cell_caret(0, 1))
            .unwrap();
        let table = table_of(&result.doc);
        assert_eq!(table.children().len(), 3);
        assert_eq!(
            table.children()[0].children()[0].int_attr(attrs::ROWSPAN, 1),
            3
        );
        // The new tr holds one fresh cell, under the spanned column none.
        assert_eq!(table.children()[1].children().len(), 1);
        GridMap::build(table).unwrap();
    }

    #[test]
    fn test_add_column_before() {
        let doc = table_doc(2, 2);
        let result = AddColumn::new(InsertSide::Before)
            .apply(&doc, &cell_caret(1, 1))
            .unwrap();
        let table = table_of(&result.doc);
        let grid = GridMap::build(table).unwrap();
        assert_eq!(grid.cols(), 3);
        assert_eq!(table.children()[0].children().len(), 3);
    }

    #[test]
    fn test_add_column_grows_crossing_colspan() {
        let mut doc = table_doc(2, 2);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0].set_attr(attrs::COLSPAN, 2i64);
        table.children_mut()[0].children_mut().remove(1);

        // Caret in row 1 cell 0 (grid column 0), add after: boundary 1
        // crosses the colspan in row 0.
        let result = AddColumn::new(InsertSide::After)
            .apply(&doc, &cell_caret(1, 0))
            .unwrap();
        let table = table_of(&result.doc);
        assert_eq!(
            table.children()[0].children()[0].int_attr(attrs::COLSPAN, 1),
            3
        );
        assert_eq!(table.children()[1].children().len(), 3);
        GridMap::build(table).unwrap();
    }

    #[test]
    fn test_add_then_delete_row_is_noop() {
        let mut doc = table_doc(2, 3);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0]
            .children_mut()
            .push(Node::paragraph(vec![Node::text("keep")]));

        let added = AddRow::new(InsertSide::After)
            .apply(&doc, &cell_caret(0, 1))
            .unwrap();
        let deleted = DeleteRow.apply(&added.doc, &cell_caret(1, 0)).unwrap();
        assert_eq!(table_of(&deleted.doc), table_of(&doc));
    }

    #[test]
    fn test_add_then_delete_column_is_noop() {
        let mut doc = table_doc(2, 2);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[1].children_mut()[1]
            .children_mut()
            .push(Node::paragraph(vec![Node::text("keep")]));

        let added = AddColumn::new(InsertSide::Before)
            .apply(&doc, &cell_caret(0, 1))
            .unwrap();
        let deleted = DeleteColumn.apply(&added.doc, &cell_caret(0, 1)).unwrap();
        assert_eq!(table_of(&deleted.doc), table_of(&doc));
    }

    #[test]
    fn test_delete_row_moves_rowspan_remainder() {
        let mut doc = table_doc(3, 2);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0].set_attr(attrs::ROWSPAN, 2i64);
        table.children_mut()[1].children_mut().remove(0);
        // Put text in the spanning cell so the carried copy is visible.
        table.children_mut()[0].children_mut()[0]
            .children_mut()
            .push(Node::paragraph(vec![Node::text("span")]));

        let result = DeleteRow.apply(&doc, &cell_caret(0, 1)).unwrap();
        let table = table_of(&result.doc);
        assert_eq!(table.children().len(), 2);
        let carried = &table.children()[0].children()[0];
        assert_eq!(carried.int_attr(attrs::ROWSPAN, 1), 1);
        assert!(carried.plain_text().contains("span"));
        GridMap::build(table).unwrap();
    }

    #[test]
    fn test_delete_row_shrinks_span_from_above() {
        let mut doc = table_doc(3, 2);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0].set_attr(attrs::ROWSPAN, 2i64);
        table.children_mut()[1].children_mut().remove(0);

        // Delete grid row 1; the span from row 0 shrinks to 1.
        let result = DeleteRow.apply(&doc, &cell_caret(1, 0)).unwrap();
        let table = table_of(&result.doc);
        assert_eq!(table.children().len(), 2);
        assert_eq!(
            table.children()[0].children()[0].int_attr(attrs::ROWSPAN, 1),
            1
        );
        GridMap::build(table).unwrap();
    }

    #[test]
    fn test_delete_last_row_deletes_table() {
        let doc = table_doc(1, 2);
        let result = DeleteRow.apply(&doc, &cell_caret(0, 0)).unwrap();
        assert!(result
            .doc
            .children()
            .iter()
            .all(|n| n.node_type() != NodeType::Table));
    }

    #[test]
    fn test_delete_column_shrinks_colspan() {
        let mut doc = table_doc(2, 3);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0].set_attr(attrs::COLSPAN, 2i64);
        table.children_mut()[0].children_mut().remove(1);
        table.children_mut()[0].children_mut()[0]
            .children_mut()
            .push(Node::paragraph(vec![Node::text("wide")]));

        // Delete grid column 0: the wide cell shrinks and keeps content.
        let result = DeleteColumn.apply(&doc, &cell_caret(1, 0)).unwrap();
        let table = table_of(&result.doc);
        let grid = GridMap::build(table).unwrap();
        assert_eq!(grid.cols(), 2);
        assert!(table.children()[0].children()[0]
            .plain_text()
            .contains("wide"));
    }

    #[test]
    fn test_delete_last_column_deletes_table() {
        let doc = table_doc(3, 1);
        let result = DeleteColumn.apply(&doc, &cell_caret(1, 0)).unwrap();
        assert!(result
            .doc
            .children()
            .iter()
            .all(|n| n.node_type() != NodeType::Table));
    }

    #[test]
    fn test_merge_rectangle() {
        let mut doc = table_doc(2, 2);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0]
            .children_mut()
            .push(Node::paragraph(vec![Node::text("a")]));
        table.children_mut()[1].children_mut()[1]
            .children_mut()
            .push(Node::paragraph(vec![Node::text("d")]));

        let sel = Selection::new(
            Position::new(vec![1, 0, 0, 0], 0),
            Position::new(vec![1, 1, 1, 0], 0),
        );
        let result = MergeCells.apply(&doc, &sel).unwrap();
        let table = table_of(&result.doc);
        let merged = &table.children()[0].children()[0];
        assert_eq!(merged.int_attr(attrs::COLSPAN, 1), 2);
        assert_eq!(merged.int_attr(attrs::ROWSPAN, 1), 2);
        assert!(merged.plain_text().contains('a'));
        assert!(merged.plain_text().contains('d'));
        GridMap::build(table).unwrap();
    }

    #[test]
    fn test_merge_partial_span_rejected() {
        // Row 0: a 2-wide cell over columns 0-1, then a unit cell.
        // Selecting that unit cell together with row 1 column 1 builds a
        // rectangle over columns 1-2, which cuts the wide cell in half.
        let mut doc = table_doc(2, 3);
        let table = doc.children_mut().get_mut(1).unwrap();
        table.children_mut()[0].children_mut()[0].set_attr(attrs::COLSPAN, 2i64);
        table.children_mut()[0].children_mut().remove(1);

        let sel = Selection::new(
            Position::new(vec![1, 0, 1, 0], 0),
            Position::new(vec![1, 1, 1, 0], 0),
        );
        let err = MergeCells.apply(&doc, &sel).unwrap_err();
        assert!(err.is_not_applicable());
    }

    #[test]
    fn test_merge_single_cell_not_applicable() {
        let doc = table_doc(2, 2);
        let err = MergeCells.apply(&doc, &cell_caret(0, 0)).unwrap_err();
        assert!(err.is_not_applicable());
    }

    #[test]
    fn test_split_restores_unit_cells() {
        let doc = table_doc(2, 2);
        let sel = Selection::new(
            Position::new(vec![1, 0, 0, 0], 0),
            Position::new(vec![1, 1, 1, 0], 0),
        );
        let merged = MergeCells.apply(&doc, &sel).unwrap();
        let split = SplitCell.apply(&merged.doc, &merged.selection).unwrap();
        let table = table_of(&split.doc);
        let grid = GridMap::build(table).unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
        assert_eq!(table.children()[0].children().len(), 2);
        assert_eq!(table.children()[1].children().len(), 2);
    }

    #[test]
    fn test_split_unmerged_not_applicable() {
        let doc = table_doc(2, 2);
        let err = SplitCell.apply(&doc, &cell_caret(0, 0)).unwrap_err();
        assert!(err.is_not_applicable());
    }

    #[test]
    fn test_set_cell_background_over_rect() {
        let doc = table_doc(2, 3);
        let sel = Selection::new(
            Position::new(vec![1, 0, 0, 0], 0),
            Position::new(vec![1, 1, 1, 0], 0),
        );
        let result = SetCellAttr::background("#fde68a").apply(&doc, &sel).unwrap();
        let table = table_of(&result.doc);
        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(
                    table.children()[r].children()[c].str_attr(attrs::BACKGROUND_COLOR),
                    "#fde68a"
                );
            }
        }
        assert_eq!(
            table.children()[0].children()[2].str_attr(attrs::BACKGROUND_COLOR),
            ""
        );
    }

    #[test]
    fn test_set_cell_attr_rejects_wide_gamut() {
        let doc = table_doc(1, 1);
        let err = SetCellAttr::background("oklch(0.9 0.02 90)")
            .apply(&doc, &cell_caret(0, 0))
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidInput(_)));
    }

    #[test]
    fn test_unset_cell_attr() {
        let doc = table_doc(1, 2);
        let sel = Selection::new(
            Position::new(vec![1, 0, 0, 0], 0),
            Position::new(vec![1, 0, 1, 0], 0),
        );
        let set = SetCellAttr::background("#fff").apply(&doc, &sel).unwrap();
        let unset = UnsetCellAttr::new(attrs::BACKGROUND_COLOR)
            .apply(&set.doc, &sel)
            .unwrap();
        assert_eq!(unset.doc, doc);

        let err = UnsetCellAttr::new(attrs::BACKGROUND_COLOR)
            .apply(&doc, &sel)
            .unwrap_err();
        assert!(err.is_not_applicable());
    }
}
