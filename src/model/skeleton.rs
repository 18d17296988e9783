use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::ids::{RowId, parse_cell_key};

fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(TaskStatus::NotStarted),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!(
                "unknown status '{}' (expected not_started, in_progress or done)",
                other
            )),
        }
    }
}

/// Statistical meaning of parenthesised numbers in the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    TStat,
    StdErr,
    PValue,
    #[default]
    Unknown,
}

impl BracketType {
    pub const ALL: [BracketType; 4] = [
        BracketType::TStat,
        BracketType::StdErr,
        BracketType::PValue,
        BracketType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BracketType::TStat => "t_stat",
            BracketType::StdErr => "std_err",
            BracketType::PValue => "p_value",
            BracketType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BracketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BracketType::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown bracket type '{}' (expected t_stat, std_err, p_value or unknown)",
                    s
                )
            })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XRole {
    #[default]
    Key,
    Control,
    Interaction,
    Other,
}

impl XRole {
    pub fn as_str(self) -> &'static str {
        match self {
            XRole::Key => "key",
            XRole::Control => "control",
            XRole::Interaction => "interaction",
            XRole::Other => "other",
        }
    }
}

impl fmt::Display for XRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key" => Ok(XRole::Key),
            "control" => Ok(XRole::Control),
            "interaction" => Ok(XRole::Interaction),
            "other" => Ok(XRole::Other),
            other => Err(format!(
                "unknown role '{}' (expected key, control, interaction or other)",
                other
            )),
        }
    }
}

/// Outcome-variable column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YColumn {
    pub col: usize,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub depvar_label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub depvar_data_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
}

/// Regressor row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XRow {
    pub row: RowId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data_var_name: String,
    #[serde(default)]
    pub role: XRole,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
}

/// Fixed-effects indicator row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeRow {
    pub row: RowId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data_var_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
}

/// Observation-count row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsRow {
    pub row: RowId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
}

/// Free-form notes keyed by row id, column index and cell key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCollection {
    #[serde(default)]
    pub rows: BTreeMap<String, String>,
    #[serde(default)]
    pub cols: BTreeMap<String, String>,
    #[serde(default)]
    pub cells: BTreeMap<String, String>,
}

/// Structured annotation of one table's statistical layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skeleton {
    #[serde(default)]
    pub paper_id: String,
    #[serde(default)]
    pub table_id: String,
    #[serde(default)]
    pub grid_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,

    #[serde(default = "default_skeleton_status")]
    pub status: TaskStatus,

    #[serde(default)]
    pub bracket_type_default: BracketType,
    #[serde(default)]
    pub bracket_type_overrides: BTreeMap<String, BracketType>,

    #[serde(default)]
    pub y_columns: Vec<YColumn>,
    #[serde(default)]
    pub x_rows: Vec<XRow>,
    #[serde(default)]
    pub fe_rows: Vec<FeRow>,
    #[serde(default)]
    pub obs_rows: Vec<ObsRow>,

    #[serde(default)]
    pub notes: NoteCollection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

fn default_skeleton_status() -> TaskStatus {
    TaskStatus::InProgress
}

impl Skeleton {
    /// Fresh skeleton for a table that has never been annotated.
    pub fn new_for_table(
        paper_id: &str,
        table_id: &str,
        grid_file: &str,
        image_file: Option<&str>,
    ) -> Self {
        Self {
            paper_id: paper_id.to_string(),
            table_id: table_id.to_string(),
            grid_file: grid_file.to_string(),
            image_file: image_file.map(|s| s.to_string()),
            status: TaskStatus::InProgress,
            ..Self::default()
        }
    }

    pub fn y_column(&self, col: usize) -> Option<&YColumn> {
        self.y_columns.iter().find(|c| c.col == col)
    }

    pub fn x_row(&self, row: RowId) -> Option<&XRow> {
        self.x_rows.iter().find(|r| r.row == row)
    }

    pub fn fe_row(&self, row: RowId) -> Option<&FeRow> {
        self.fe_rows.iter().find(|r| r.row == row)
    }

    pub fn obs_row(&self, row: RowId) -> Option<&ObsRow> {
        self.obs_rows.iter().find(|r| r.row == row)
    }

    /// Whether anything in the skeleton is keyed by this row id.
    pub fn has_row_annotations(&self, row: RowId) -> bool {
        self.x_row(row).is_some()
            || self.fe_row(row).is_some()
            || self.obs_row(row).is_some()
            || self.notes.rows.contains_key(&row.to_string())
            || self
                .notes
                .cells
                .keys()
                .chain(self.bracket_type_overrides.keys())
                .any(|k| parse_cell_key(k).is_some_and(|(r, _)| r == row))
    }

    /// Drops duplicate entries from the tag sets, keeping the first of each key.
    pub fn deduplicated(mut self) -> Self {
        let mut seen = HashSet::new();
        self.y_columns.retain(|c| seen.insert(c.col));
        let mut seen = HashSet::new();
        self.x_rows.retain(|r| seen.insert(r.row));
        let mut seen = HashSet::new();
        self.fe_rows.retain(|r| seen.insert(r.row));
        let mut seen = HashSet::new();
        self.obs_rows.retain(|r| seen.insert(r.row));
        self
    }
}
