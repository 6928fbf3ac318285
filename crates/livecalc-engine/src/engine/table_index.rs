//! Coordinate-addressed view of every table in a snapshot.
//!
//! Tables are identified as `table1`, `table2`, ... in order of appearance and
//! their cells are addressed by [`CellRef`]. The index is rebuilt from scratch
//! for every evaluation cycle and never mutated afterwards, so it is shared
//! with engine builtins behind a plain `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use super::cell_ref::CellRef;
use super::document::{DocumentTree, TableNode};

/// Shared, read-only handle registered into the Rhai engine.
pub type SharedIndex = Arc<TableIndex>;

/// Prefix of every table identifier.
pub const TABLE_ID_PREFIX: &str = "table";

/// Identifier of the `ordinal`-th table (1-based).
pub fn table_id(ordinal: usize) -> String {
    format!("{}{}", TABLE_ID_PREFIX, ordinal)
}

/// Cell texts of one table keyed by coordinate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    cells: HashMap<CellRef, String>,
    /// Number of rows, and of cells in the widest row.
    rows: usize,
    cols: usize,
}

impl Table {
    fn from_node(node: &TableNode) -> Table {
        let mut cells = HashMap::new();
        for (row_index, row) in node.rows.iter().enumerate() {
            for (cell_index, cell) in row.cells.iter().enumerate() {
                cells.insert(
                    CellRef::from_position(row_index, cell_index),
                    cell.text.trim().to_string(),
                );
            }
        }
        Table {
            cells,
            rows: node.rows.len(),
            cols: node.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0),
        }
    }

    /// Trimmed text at `cell_ref`, `""` for an empty cell, None outside the table.
    pub fn cell(&self, cell_ref: &CellRef) -> Option<&str> {
        self.cells.get(cell_ref).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Numeric values in the rectangle spanned by `start` and `end`.
    ///
    /// Bounds are normalized, so `B2:A1` covers the same cells as `A1:B2`.
    /// Cells are visited column by column (each column top to bottom); cells
    /// that are missing or do not parse as a finite number are skipped.
    pub fn range_values(&self, start: &CellRef, end: &CellRef) -> Vec<f64> {
        let min_col = start.col.min(end.col);
        let min_row = start.row.min(end.row);
        if min_col >= self.cols || min_row >= self.rows {
            return Vec::new();
        }
        // Nothing lies beyond the table's extent.
        let max_col = start.col.max(end.col).min(self.cols - 1);
        let max_row = start.row.max(end.row).min(self.rows - 1);

        let mut values = Vec::new();
        for col in min_col..=max_col {
            for row in min_row..=max_row {
                if let Some(n) = self.cell(&CellRef::new(col, row)).and_then(parse_number) {
                    values.push(n);
                }
            }
        }
        values
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Every table of one snapshot, keyed by `table<N>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableIndex {
    tables: HashMap<String, Table>,
}

impl TableIndex {
    pub fn build(tree: &DocumentTree) -> TableIndex {
        let tables = tree
            .tables
            .iter()
            .enumerate()
            .map(|(i, node)| (table_id(i + 1), Table::from_node(node)))
            .collect();
        TableIndex { tables }
    }

    pub fn from_markup(snapshot: &str) -> TableIndex {
        TableIndex::build(&DocumentTree::from_markup(snapshot))
    }

    pub fn get(&self, id: &str) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tables.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Table identifiers sorted by ordinal.
    pub fn table_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        ids.sort_by_key(|id| {
            id.strip_prefix(TABLE_ID_PREFIX)
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(usize::MAX)
        });
        ids
    }
}
