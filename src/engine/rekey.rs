//! Keeps skeleton keys attached to the rows and columns they annotate when
//! the grid changes shape.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{RowId, Skeleton, cell_key, parse_cell_key};

use super::grid_ops::ColumnShift;

/// What a structural edit did to existing annotations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RekeyReport {
    pub moved_rows: Vec<(RowId, RowId)>,
    pub dropped_rows: Vec<RowId>,
    pub moved_columns: Vec<(usize, usize)>,
    pub dropped_columns: Vec<usize>,
}

impl RekeyReport {
    pub fn is_empty(&self) -> bool {
        self.moved_rows.is_empty()
            && self.dropped_rows.is_empty()
            && self.moved_columns.is_empty()
            && self.dropped_columns.is_empty()
    }
}

/// Old row id -> new row id, or `None` when the row is gone. Ids not in the
/// map are untouched. All entries apply simultaneously.
pub type RowRemap = BTreeMap<RowId, Option<RowId>>;

fn remap_row(remap: &RowRemap, row: RowId) -> Option<RowId> {
    match remap.get(&row) {
        Some(target) => *target,
        None => Some(row),
    }
}

fn remap_cell_keys<V: Clone>(
    map: &BTreeMap<String, V>,
    f: impl Fn(RowId, usize) -> Option<(RowId, usize)>,
) -> BTreeMap<String, V> {
    map.iter()
        .filter_map(|(k, v)| match parse_cell_key(k) {
            Some((row, col)) => f(row, col).map(|(r, c)| (cell_key(r, c), v.clone())),
            None => Some((k.clone(), v.clone())),
        })
        .collect()
}

pub fn rekey_rows(skeleton: &Skeleton, remap: &RowRemap) -> (Skeleton, RekeyReport) {
    let mut report = RekeyReport::default();
    if remap.is_empty() {
        return (skeleton.clone(), report);
    }

    let mut next = skeleton.clone();
    next.x_rows = skeleton
        .x_rows
        .iter()
        .filter_map(|r| {
            remap_row(remap, r.row).map(|row| {
                let mut r = r.clone();
                r.row = row;
                r
            })
        })
        .collect();
    next.fe_rows = skeleton
        .fe_rows
        .iter()
        .filter_map(|r| {
            remap_row(remap, r.row).map(|row| {
                let mut r = r.clone();
                r.row = row;
                r
            })
        })
        .collect();
    next.obs_rows = skeleton
        .obs_rows
        .iter()
        .filter_map(|r| {
            remap_row(remap, r.row).map(|row| {
                let mut r = r.clone();
                r.row = row;
                r
            })
        })
        .collect();
    next.notes.rows = skeleton
        .notes
        .rows
        .iter()
        .filter_map(|(k, v)| match k.trim().parse::<i64>() {
            Ok(n) => remap_row(remap, RowId(n)).map(|r| (r.to_string(), v.clone())),
            Err(_) => Some((k.clone(), v.clone())),
        })
        .collect();
    let cell = |row: RowId, col: usize| remap_row(remap, row).map(|r| (r, col));
    next.notes.cells = remap_cell_keys(&skeleton.notes.cells, cell);
    next.bracket_type_overrides = remap_cell_keys(&skeleton.bracket_type_overrides, cell);

    for (&old, &new) in remap {
        if !skeleton.has_row_annotations(old) {
            continue;
        }
        match new {
            Some(new) => report.moved_rows.push((old, new)),
            None => report.dropped_rows.push(old),
        }
    }
    (next, report)
}

/// First row id keyed more than once within one of the row tag sets.
pub fn duplicate_row_key(skeleton: &Skeleton) -> Option<RowId> {
    let sets = [
        skeleton.x_rows.iter().map(|r| r.row).collect::<Vec<_>>(),
        skeleton.fe_rows.iter().map(|r| r.row).collect(),
        skeleton.obs_rows.iter().map(|r| r.row).collect(),
    ];
    sets.into_iter().find_map(|ids| {
        let mut seen = BTreeSet::new();
        ids.into_iter().find(|id| !seen.insert(*id))
    })
}

pub fn rekey_columns(skeleton: &Skeleton, shift: ColumnShift) -> (Skeleton, RekeyReport) {
    let mut report = RekeyReport::default();
    let mut annotated: BTreeSet<usize> = skeleton.y_columns.iter().map(|c| c.col).collect();
    annotated.extend(
        skeleton
            .notes
            .cols
            .keys()
            .filter_map(|k| k.trim().parse::<usize>().ok()),
    );
    annotated.extend(
        skeleton
            .notes
            .cells
            .keys()
            .chain(skeleton.bracket_type_overrides.keys())
            .filter_map(|k| parse_cell_key(k).map(|(_, c)| c)),
    );
    for col in annotated {
        match shift.map(col) {
            Some(new) if new != col => report.moved_columns.push((col, new)),
            Some(_) => {}
            None => report.dropped_columns.push(col),
        }
    }

    let mut next = skeleton.clone();
    next.y_columns = skeleton
        .y_columns
        .iter()
        .filter_map(|c| {
            shift.map(c.col).map(|col| {
                let mut c = c.clone();
                c.col = col;
                c
            })
        })
        .collect();
    next.notes.cols = skeleton
        .notes
        .cols
        .iter()
        .filter_map(|(k, v)| match k.trim().parse::<usize>() {
            Ok(col) => shift.map(col).map(|c| (c.to_string(), v.clone())),
            Err(_) => Some((k.clone(), v.clone())),
        })
        .collect();
    let cell = |row: RowId, col: usize| shift.map(col).map(|c| (row, c));
    next.notes.cells = remap_cell_keys(&skeleton.notes.cells, cell);
    next.bracket_type_overrides = remap_cell_keys(&skeleton.bracket_type_overrides, cell);
    (next, report)
}
