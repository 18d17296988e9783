//! Logical row identity.
//!
//! A row's id is the integer printed in its identity cell (`row[0]`) when
//! there is one, otherwise its 1-based position. Column identity is the raw
//! positional index; only column 0 is reserved.

use std::collections::BTreeMap;

use crate::model::{Grid, RowId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowIdentity {
    /// Taken from the leading integer of the identity cell.
    Printed(i64),
    /// Fallback: 1-based position in the grid.
    Positional(i64),
}

impl RowIdentity {
    pub fn resolve(row: &[String], position: usize) -> Self {
        match row.first().and_then(|c| parse_leading_int(c)) {
            Some(n) => RowIdentity::Printed(n),
            None => RowIdentity::Positional(position as i64 + 1),
        }
    }

    pub fn row_id(self) -> RowId {
        match self {
            RowIdentity::Printed(n) | RowIdentity::Positional(n) => RowId(n),
        }
    }
}

/// Leading optionally-signed decimal integer, ignoring leading whitespace and
/// any trailing text (`"12a"` is 12). Values that do not fit in `i64` have no
/// printed id.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let n = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -n } else { n })
}

pub fn row_id_at(grid: &Grid, position: usize) -> Option<RowId> {
    grid.rows
        .get(position)
        .map(|r| RowIdentity::resolve(r, position).row_id())
}

pub fn row_ids(grid: &Grid) -> Vec<RowId> {
    grid.rows
        .iter()
        .enumerate()
        .map(|(i, r)| RowIdentity::resolve(r, i).row_id())
        .collect()
}

/// Position of the first row resolving to `id`.
pub fn position_of(grid: &Grid, id: RowId) -> Option<usize> {
    row_ids(grid).into_iter().position(|r| r == id)
}

/// Two or more rows resolving to the same logical id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collision {
    pub id: RowId,
    pub positions: Vec<usize>,
}

pub fn find_collisions(grid: &Grid) -> Vec<Collision> {
    let mut by_id: BTreeMap<RowId, Vec<usize>> = BTreeMap::new();
    for (pos, id) in row_ids(grid).into_iter().enumerate() {
        by_id.entry(id).or_default().push(pos);
    }
    by_id
        .into_iter()
        .filter(|(_, positions)| positions.len() > 1)
        .map(|(id, positions)| Collision { id, positions })
        .collect()
}

#[cfg(test)]
#[path = "../tests/engine/identity_tests.rs"]
mod tests;
