//! Skeleton annotation mutators.
//!
//! Every function takes the current skeleton by reference and returns an
//! updated copy. Callers are responsible for marking the draft dirty.

use std::fmt;
use std::str::FromStr;

use crate::model::{
    BracketType, FeRow, ObsRow, RowId, Skeleton, TaskStatus, XRole, XRow, YColumn, cell_key,
};

use super::error::EngineError;

/// One of the four keyed tag sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationSet {
    YColumns,
    XRows,
    FeRows,
    ObsRows,
}

impl AnnotationSet {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationSet::YColumns => "y_columns",
            AnnotationSet::XRows => "x_rows",
            AnnotationSet::FeRows => "fe_rows",
            AnnotationSet::ObsRows => "obs_rows",
        }
    }
}

impl fmt::Display for AnnotationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "y" | "y_columns" => Ok(AnnotationSet::YColumns),
            "x" | "x_rows" => Ok(AnnotationSet::XRows),
            "fe" | "fe_rows" => Ok(AnnotationSet::FeRows),
            "obs" | "obs_rows" => Ok(AnnotationSet::ObsRows),
            other => Err(format!("unknown annotation set '{}'", other)),
        }
    }
}

/// Target of a free-form note.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteTarget {
    Row(RowId),
    Column(usize),
    Cell(RowId, usize),
}

pub fn toggle_y_column(skeleton: &Skeleton, col: usize) -> Skeleton {
    let mut next = skeleton.clone();
    if next.y_columns.iter().any(|c| c.col == col) {
        next.y_columns.retain(|c| c.col != col);
    } else {
        next.y_columns.push(YColumn {
            col,
            ..YColumn::default()
        });
    }
    next
}

pub fn toggle_x_row(skeleton: &Skeleton, row: RowId, default_label: &str) -> Skeleton {
    let mut next = skeleton.clone();
    if next.x_rows.iter().any(|r| r.row == row) {
        next.x_rows.retain(|r| r.row != row);
    } else {
        next.x_rows.push(new_x_row(row, default_label));
    }
    next
}

pub fn toggle_fe_row(skeleton: &Skeleton, row: RowId, label: &str) -> Skeleton {
    let mut next = skeleton.clone();
    if next.fe_rows.iter().any(|r| r.row == row) {
        next.fe_rows.retain(|r| r.row != row);
    } else {
        next.fe_rows.push(FeRow {
            row,
            label: label.to_string(),
            data_var_name: String::new(),
            note: String::new(),
        });
    }
    next
}

pub fn toggle_obs_row(skeleton: &Skeleton, row: RowId, label: &str) -> Skeleton {
    let mut next = skeleton.clone();
    if next.obs_rows.iter().any(|r| r.row == row) {
        next.obs_rows.retain(|r| r.row != row);
    } else {
        next.obs_rows.push(ObsRow {
            row,
            label: label.to_string(),
            note: String::new(),
        });
    }
    next
}

/// Upserts an X row and forces its role to `key`.
pub fn set_core_row(skeleton: &Skeleton, row: RowId, default_label: &str) -> Skeleton {
    let mut next = skeleton.clone();
    match next.x_rows.iter_mut().find(|r| r.row == row) {
        Some(existing) => existing.role = XRole::Key,
        None => next.x_rows.push(new_x_row(row, default_label)),
    }
    next
}

fn new_x_row(row: RowId, label: &str) -> XRow {
    XRow {
        row,
        display_label: label.to_string(),
        data_var_name: String::new(),
        role: XRole::Key,
        note: String::new(),
    }
}

/// Replaces one field of an existing entry. A missing entry is left missing.
pub fn update_field(
    skeleton: &Skeleton,
    set: AnnotationSet,
    key: i64,
    field: &str,
    value: &str,
) -> Result<Skeleton, EngineError> {
    let known: &[&str] = match set {
        AnnotationSet::YColumns => &["depvar_label", "depvar_data_name", "note"],
        AnnotationSet::XRows => &["display_label", "data_var_name", "role", "note"],
        AnnotationSet::FeRows => &["label", "data_var_name", "note"],
        AnnotationSet::ObsRows => &["label", "note"],
    };
    if !known.contains(&field) {
        return Err(EngineError::InvalidField {
            set: set.as_str(),
            field: field.to_string(),
        });
    }

    let mut next = skeleton.clone();
    let value = value.to_string();
    let row = RowId(key);
    match set {
        AnnotationSet::YColumns => {
            let entry = usize::try_from(key)
                .ok()
                .and_then(|col| next.y_columns.iter_mut().find(|c| c.col == col));
            if let Some(entry) = entry {
                match field {
                    "depvar_label" => entry.depvar_label = value,
                    "depvar_data_name" => entry.depvar_data_name = value,
                    _ => entry.note = value,
                }
            }
        }
        AnnotationSet::XRows => {
            let role = match field {
                "role" => Some(value.parse::<XRole>().map_err(EngineError::InvalidValue)?),
                _ => None,
            };
            if let Some(entry) = next.x_rows.iter_mut().find(|r| r.row == row) {
                match (field, role) {
                    (_, Some(role)) => entry.role = role,
                    ("display_label", _) => entry.display_label = value,
                    ("data_var_name", _) => entry.data_var_name = value,
                    _ => entry.note = value,
                }
            }
        }
        AnnotationSet::FeRows => {
            if let Some(entry) = next.fe_rows.iter_mut().find(|r| r.row == row) {
                match field {
                    "label" => entry.label = value,
                    "data_var_name" => entry.data_var_name = value,
                    _ => entry.note = value,
                }
            }
        }
        AnnotationSet::ObsRows => {
            if let Some(entry) = next.obs_rows.iter_mut().find(|r| r.row == row) {
                match field {
                    "label" => entry.label = value,
                    _ => entry.note = value,
                }
            }
        }
    }
    Ok(next)
}

pub fn set_status(skeleton: &Skeleton, status: TaskStatus) -> Skeleton {
    let mut next = skeleton.clone();
    next.status = status;
    next
}

pub fn set_bracket_default(skeleton: &Skeleton, bracket: BracketType) -> Skeleton {
    let mut next = skeleton.clone();
    next.bracket_type_default = bracket;
    next
}

/// `None` clears the override so the cell falls back to the default.
pub fn set_bracket_override(
    skeleton: &Skeleton,
    row: RowId,
    col: usize,
    bracket: Option<BracketType>,
) -> Skeleton {
    let mut next = skeleton.clone();
    let key = cell_key(row, col);
    match bracket {
        Some(b) => {
            next.bracket_type_overrides.insert(key, b);
        }
        None => {
            next.bracket_type_overrides.remove(&key);
        }
    }
    next
}

/// An empty (or all-whitespace) value removes the note.
pub fn set_note(skeleton: &Skeleton, target: NoteTarget, value: &str) -> Skeleton {
    let mut next = skeleton.clone();
    let (map, key) = match target {
        NoteTarget::Row(row) => (&mut next.notes.rows, row.to_string()),
        NoteTarget::Column(col) => (&mut next.notes.cols, col.to_string()),
        NoteTarget::Cell(row, col) => (&mut next.notes.cells, cell_key(row, col)),
    };
    if value.trim().is_empty() {
        map.remove(&key);
    } else {
        map.insert(key, value.to_string());
    }
    next
}

#[cfg(test)]
#[path = "../tests/engine/annotate_tests.rs"]
mod tests;
