//! Task listing, detail, save, suggestion and config calls.

use super::*;
use super::http_client::root_query;

fn table_path(paper_id: &str, table_id: &str, suffix: &str) -> String {
    format!("/api/table/{}/{}{}", paper_id, table_id, suffix)
}

impl RemoteClient {
    pub fn list_tables(&self, root_dir: Option<&str>) -> Result<Vec<TableListItem>> {
        with_retries("list tables", || {
            let resp = self
                .client
                .get(self.url("/api/projects"))
                .query(&root_query(root_dir))
                .send()
                .context("list tables request")?;
            self.ensure_ok(resp, "list tables")?
                .json()
                .context("parse table list")
        })
    }

    pub fn get_table(
        &self,
        paper_id: &str,
        table_id: &str,
        root_dir: Option<&str>,
    ) -> Result<TaskDetail> {
        let resp = self
            .client
            .get(self.url(&table_path(paper_id, table_id, "")))
            .query(&root_query(root_dir))
            .send()
            .context("get table request")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("table {}/{} not found", paper_id, table_id);
        }

        let detail: TaskDetail = self
            .ensure_ok(resp, "get table")?
            .json()
            .context("parse table detail")?;
        Ok(detail)
    }

    pub fn image_url(&self, paper_id: &str, table_id: &str, root_dir: Option<&str>) -> String {
        let url = self.url(&table_path(paper_id, table_id, "/image"));
        match reqwest::Url::parse_with_params(&url, root_query(root_dir)) {
            Ok(u) => u.to_string(),
            Err(_) => url,
        }
    }

    pub fn save_grid(
        &self,
        paper_id: &str,
        table_id: &str,
        root_dir: Option<&str>,
        grid: &Grid,
    ) -> Result<SaveGridResponse> {
        let resp = self
            .client
            .post(self.url(&table_path(paper_id, table_id, "/save_csv")))
            .query(&root_query(root_dir))
            .json(grid)
            .send()
            .context("save grid request")?;
        self.ensure_ok(resp, "save grid")?
            .json()
            .context("parse save grid response")
    }

    pub fn save_skeleton(
        &self,
        paper_id: &str,
        table_id: &str,
        root_dir: Option<&str>,
        skeleton: &Skeleton,
    ) -> Result<SaveSkeletonResponse> {
        let resp = self
            .client
            .post(self.url(&table_path(paper_id, table_id, "/save_skeleton")))
            .query(&root_query(root_dir))
            .json(skeleton)
            .send()
            .context("save skeleton request")?;
        self.ensure_ok(resp, "save skeleton")?
            .json()
            .context("parse save skeleton response")
    }

    /// Not retried: each attempt is a paid model call.
    pub fn suggest(
        &self,
        paper_id: &str,
        table_id: &str,
        root_dir: Option<&str>,
        instruction: Option<&str>,
    ) -> Result<Vec<Vec<String>>> {
        let resp = self
            .client
            .post(self.url(&table_path(paper_id, table_id, "/suggest")))
            .query(&root_query(root_dir))
            .json(&SuggestRequest { instruction })
            .send()
            .context("suggest request")?;
        let out: SuggestResponse = self
            .ensure_ok(resp, "suggest")?
            .json()
            .context("parse suggestion")?;
        Ok(out.rows)
    }

    pub fn get_config(&self) -> Result<BackendConfig> {
        with_retries("get config", || {
            let resp = self
                .client
                .get(self.url("/api/config"))
                .send()
                .context("get config request")?;
            self.ensure_ok(resp, "get config")?
                .json()
                .context("parse config")
        })
    }

    pub fn set_config(&self, update: &ConfigUpdate) -> Result<BackendConfig> {
        let resp = self
            .client
            .post(self.url("/api/config"))
            .json(update)
            .send()
            .context("set config request")?;
        self.ensure_ok(resp, "set config")?
            .json()
            .context("parse config")
    }
}
