use anyhow::Result;

use crate::model::{BackendConfig, ConfigUpdate, Grid, Skeleton, TableListItem, TaskDetail, TaskKey};

/// Persistence and suggestion services the engine depends on.
///
/// `root_dir` scopes which backing directory is used; `None` means the
/// server-side default.
pub trait Backend {
    fn list_tasks(&self, root_dir: Option<&str>) -> Result<Vec<TableListItem>>;

    fn get_task_detail(&self, key: &TaskKey, root_dir: Option<&str>) -> Result<TaskDetail>;

    /// URL of the source image; the engine never fetches it.
    fn image_url(&self, key: &TaskKey, root_dir: Option<&str>) -> String;

    fn save_grid(&self, key: &TaskKey, root_dir: Option<&str>, grid: &Grid) -> Result<()>;

    fn save_skeleton(&self, key: &TaskKey, root_dir: Option<&str>, skeleton: &Skeleton)
    -> Result<()>;

    fn request_suggestion(
        &self,
        key: &TaskKey,
        root_dir: Option<&str>,
        instruction: Option<&str>,
    ) -> Result<Vec<Vec<String>>>;

    fn get_config(&self) -> Result<BackendConfig>;

    fn set_config(&self, update: &ConfigUpdate) -> Result<BackendConfig>;
}
