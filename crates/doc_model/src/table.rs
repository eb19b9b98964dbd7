//! Grid geometry for tables with merged cells
//!
//! Cells in the tree carry `colspan`/`rowspan` attributes; the [`GridMap`]
//! expands them into a dense row-major occupancy grid so that structural
//! operations can reason in grid coordinates instead of tree indices.

use crate::{attrs, DocModelError, Node, NodeType, Result};

/// Identifies a cell by its row index and cell index within that row's
/// child list (tree coordinates, not grid coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub cell: usize,
}

/// Dense occupancy map of a table: every grid slot names the cell that
/// covers it
#[derive(Debug, Clone)]
pub struct GridMap {
    rows: usize,
    cols: usize,
    slots: Vec<Option<CellRef>>,
}

impl GridMap {
    /// Expand a table node into its grid, rejecting overlapping spans and
    /// non-rectangular layouts
    pub fn build(table: &Node) -> Result<Self> {
        if table.node_type() != NodeType::Table {
            return Err(DocModelError::InvariantViolation(format!(
                "expected a table, found {:?}",
                table.node_type()
            )));
        }

        let row_count = table.children().len();
        if row_count == 0 {
            return Err(DocModelError::InvariantViolation(
                "table has no rows".to_string(),
            ));
        }

        // First pass: total width of the first grid row fixes the column
        // count; later rows must fill exactly that many slots.
        let mut cols = 0;
        for cell in table.children()[0].children() {
            cols += span(cell, attrs::COLSPAN);
        }
        if cols == 0 {
            return Err(DocModelError::InvariantViolation(
                "table row has no cells".to_string(),
            ));
        }

        let mut slots: Vec<Option<CellRef>> = vec![None; row_count * cols];
        for (r, row) in table.children().iter().enumerate() {
            if row.node_type() != NodeType::TableRow {
                return Err(DocModelError::InvalidChild {
                    parent: NodeType::Table,
                    child: row.node_type(),
                });
            }
            let mut c = 0;
            for (i, cell) in row.children().iter().enumerate() {
                // Skip slots already claimed by a rowspan from above.
                while c < cols && slots[r * cols + c].is_some() {
                    c += 1;
                }
                let w = span(cell, attrs::COLSPAN);
                let h = span(cell, attrs::ROWSPAN);
                if c + w > cols || r + h > row_count {
                    return Err(DocModelError::InvariantViolation(format!(
                        "cell at row {r} exceeds the {cols}-column grid"
                    )));
                }
                for dr in 0..h {
                    for dc in 0..w {
                        let slot = &mut slots[(r + dr) * cols + c + dc];
                        if slot.is_some() {
                            return Err(DocModelError::InvariantViolation(format!(
                                "overlapping cell spans at row {}, column {}",
                                r + dr,
                                c + dc
                            )));
                        }
                        *slot = Some(CellRef { row: r, cell: i });
                    }
                }
                c += w;
            }
        }

        if slots.iter().any(Option::is_none) {
            return Err(DocModelError::InvariantViolation(
                "table grid is not rectangular".to_string(),
            ));
        }

        Ok(Self {
            rows: row_count,
            cols,
            slots,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The cell covering grid slot `(row, col)`
    pub fn owner(&self, row: usize, col: usize) -> Option<CellRef> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.slots[row * self.cols + col]
    }

    /// Grid coordinates of a cell's top-left slot
    pub fn origin(&self, cell: CellRef) -> Option<(usize, usize)> {
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.slots[r * self.cols + c] == Some(cell) {
                    return Some((r, c));
                }
            }
        }
        None
    }

    /// Distinct cells whose origins fall inside the inclusive grid
    /// rectangle, in document order
    pub fn cells_in_rect(
        &self,
        top: usize,
        left: usize,
        bottom: usize,
        right: usize,
    ) -> Vec<CellRef> {
        let mut out = Vec::new();
        for r in top..=bottom.min(self.rows.saturating_sub(1)) {
            for c in left..=right.min(self.cols.saturating_sub(1)) {
                if let Some(cell) = self.slots[r * self.cols + c] {
                    if self.origin(cell) == Some((r, c)) {
                        out.push(cell);
                    }
                }
            }
        }
        out
    }
}

fn span(cell: &Node, attr: &str) -> usize {
    cell.int_attr(attr, 1).max(1) as usize
}

/// Colspan of a cell node, defaulting to 1
pub fn col_span(cell: &Node) -> usize {
    span(cell, attrs::COLSPAN)
}

/// Rowspan of a cell node, defaulting to 1
pub fn row_span(cell: &Node) -> usize {
    span(cell, attrs::ROWSPAN)
}
