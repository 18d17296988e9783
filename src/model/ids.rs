use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical row id used to key row annotations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl RowId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one annotation task (a paper/table pair).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    pub paper_id: String,
    pub table_id: String,
}

impl TaskKey {
    pub fn new(paper_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.paper_id, self.table_id)
    }
}

/// Key for a single cell in notes and bracket overrides: `"<row id>:<col>"`.
pub fn cell_key(row: RowId, col: usize) -> String {
    format!("{}:{}", row.0, col)
}

pub fn parse_cell_key(key: &str) -> Option<(RowId, usize)> {
    let (row, col) = key.split_once(':')?;
    let row = row.trim().parse::<i64>().ok()?;
    let col = col.trim().parse::<usize>().ok()?;
    Some((RowId(row), col))
}
