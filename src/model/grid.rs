use serde::{Deserialize, Serialize};

/// Label of the reserved row-identity column.
pub const ROW_ID_LABEL: &str = "row";

/// Editable table: a header plus rows of string cells.
///
/// Every row has exactly `header.len()` cells once a grid has gone through
/// [`Grid::normalized`]; all structural edits preserve that.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(|s| s.as_str())
    }

    /// `row`, `c1`, `c2`, ... for the given width.
    pub fn synthetic_header(width: usize) -> Vec<String> {
        (0..width)
            .map(|i| {
                if i == 0 {
                    ROW_ID_LABEL.to_string()
                } else {
                    format!("c{}", i)
                }
            })
            .collect()
    }

    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|r| r.len() == self.header.len())
    }

    /// Widens the header to the widest row (synthetic labels for the new
    /// columns) and pads short rows with empty cells. Always keeps at least
    /// the row-identity column.
    pub fn normalized(mut self) -> Self {
        let widest = self.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let width = widest.max(self.header.len()).max(1);
        if self.header.len() < width {
            let synthetic = Self::synthetic_header(width);
            self.header
                .extend(synthetic.into_iter().skip(self.header.len()));
        }
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        self
    }

    /// Builds a grid from bare rows, deriving a synthetic header from the
    /// widest row.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0).max(1);
        Self {
            header: Self::synthetic_header(width),
            rows,
        }
        .normalized()
    }
}
