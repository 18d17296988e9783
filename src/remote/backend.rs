use super::*;
use crate::engine::Backend;
use crate::model::TaskKey;

impl Backend for RemoteClient {
    fn list_tasks(&self, root_dir: Option<&str>) -> Result<Vec<TableListItem>> {
        self.list_tables(root_dir)
    }

    fn get_task_detail(&self, key: &TaskKey, root_dir: Option<&str>) -> Result<TaskDetail> {
        self.get_table(&key.paper_id, &key.table_id, root_dir)
    }

    fn image_url(&self, key: &TaskKey, root_dir: Option<&str>) -> String {
        RemoteClient::image_url(self, &key.paper_id, &key.table_id, root_dir)
    }

    fn save_grid(&self, key: &TaskKey, root_dir: Option<&str>, grid: &Grid) -> Result<()> {
        RemoteClient::save_grid(self, &key.paper_id, &key.table_id, root_dir, grid)?;
        Ok(())
    }

    fn save_skeleton(
        &self,
        key: &TaskKey,
        root_dir: Option<&str>,
        skeleton: &Skeleton,
    ) -> Result<()> {
        RemoteClient::save_skeleton(self, &key.paper_id, &key.table_id, root_dir, skeleton)?;
        Ok(())
    }

    fn request_suggestion(
        &self,
        key: &TaskKey,
        root_dir: Option<&str>,
        instruction: Option<&str>,
    ) -> Result<Vec<Vec<String>>> {
        self.suggest(&key.paper_id, &key.table_id, root_dir, instruction)
    }

    fn get_config(&self) -> Result<BackendConfig> {
        RemoteClient::get_config(self)
    }

    fn set_config(&self, update: &ConfigUpdate) -> Result<BackendConfig> {
        RemoteClient::set_config(self, update)
    }
}
