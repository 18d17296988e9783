//! Structural grid primitives. Each takes the current grid and returns a new
//! one; the input is never modified.

use crate::model::Grid;

use super::error::EngineError;

/// How row positions before an edit map to positions after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowShift {
    Unchanged,
    Removed(usize),
    Inserted(usize),
}

impl RowShift {
    pub fn map(self, pos: usize) -> Option<usize> {
        match self {
            RowShift::Unchanged => Some(pos),
            RowShift::Removed(at) if pos == at => None,
            RowShift::Removed(at) if pos > at => Some(pos - 1),
            RowShift::Inserted(at) if pos >= at => Some(pos + 1),
            _ => Some(pos),
        }
    }
}

/// How column indices before an edit map to indices after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnShift {
    Removed(usize),
    Inserted(usize),
}

impl ColumnShift {
    pub fn map(self, col: usize) -> Option<usize> {
        match self {
            ColumnShift::Removed(at) if col == at => None,
            ColumnShift::Removed(at) if col > at => Some(col - 1),
            ColumnShift::Inserted(at) if col >= at => Some(col + 1),
            _ => Some(col),
        }
    }
}

fn check_row(grid: &Grid, index: usize) -> Result<(), EngineError> {
    if index >= grid.height() {
        return Err(EngineError::OutOfRange {
            what: "row",
            index,
            len: grid.height(),
        });
    }
    Ok(())
}

pub fn set_cell(grid: &Grid, row: usize, col: usize, value: &str) -> Result<Grid, EngineError> {
    check_row(grid, row)?;
    if col >= grid.width() {
        return Err(EngineError::OutOfRange {
            what: "column",
            index: col,
            len: grid.width(),
        });
    }
    let mut next = grid.clone();
    next.rows[row][col] = value.to_string();
    Ok(next)
}

/// Row edits leave the width alone, so the loaded header (real column
/// names included) is kept as is. Column edits renumber it instead.
pub fn remove_row(grid: &Grid, index: usize) -> Result<Grid, EngineError> {
    check_row(grid, index)?;
    let mut next = grid.clone();
    next.rows.remove(index);
    Ok(next)
}

/// Inserts a row of empty cells so that it lands at `index`
/// (`index == height` appends). The header is kept, as in [`remove_row`].
pub fn insert_row_at(grid: &Grid, index: usize) -> Result<Grid, EngineError> {
    if index > grid.height() {
        return Err(EngineError::OutOfRange {
            what: "row",
            index,
            len: grid.height(),
        });
    }
    let mut next = grid.clone();
    next.rows.insert(index, vec![String::new(); grid.width()]);
    Ok(next)
}

pub fn remove_column(grid: &Grid, index: usize) -> Result<Grid, EngineError> {
    if index == 0 {
        return Err(EngineError::ReservedColumn);
    }
    if index >= grid.width() {
        return Err(EngineError::OutOfRange {
            what: "column",
            index,
            len: grid.width(),
        });
    }
    let width = grid.width() - 1;
    let rows = grid
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if index < row.len() {
                row.remove(index);
            }
            row.resize(width, String::new());
            row
        })
        .collect();
    Ok(Grid::new(Grid::synthetic_header(width), rows))
}

/// Inserts an empty column so that it lands at `index`
/// (`index == width` appends). The header is rebuilt synthetically.
pub fn insert_column_at(grid: &Grid, index: usize) -> Result<Grid, EngineError> {
    if index == 0 {
        return Err(EngineError::ReservedColumn);
    }
    if index > grid.width() {
        return Err(EngineError::OutOfRange {
            what: "column",
            index,
            len: grid.width(),
        });
    }
    let width = grid.width() + 1;
    let rows = grid
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.resize(width - 1, String::new());
            row.insert(index, String::new());
            row
        })
        .collect();
    Ok(Grid::new(Grid::synthetic_header(width), rows))
}

#[cfg(test)]
#[path = "../tests/engine/grid_ops_tests.rs"]
mod tests;
