use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::ids::TaskKey;
use super::skeleton::{Skeleton, TaskStatus};

/// Worklist entry for one table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableListItem {
    pub paper_id: String,
    pub table_id: String,
    pub csv_path: String,

    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub skeleton_path: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,
}

impl TableListItem {
    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.paper_id.clone(), self.table_id.clone())
    }

    pub fn is_key(&self, key: &TaskKey) -> bool {
        self.paper_id == key.paper_id && self.table_id == key.table_id
    }
}

/// Everything the backend returns for an opened task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetail {
    pub info: TableListItem,
    pub grid: Grid,
    pub skeleton: Skeleton,
}
