use anyhow::{Context, Result};

use crate::model::{BackendConfig, ConfigUpdate, Grid, Skeleton, TableListItem, TaskDetail};

mod http_client;
use self::http_client::with_retries;

mod types;
pub use self::types::*;
mod backend;
mod operations;

/// Blocking client for the tabskel server API.
pub struct RemoteClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RemoteClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("invalid server url {}", base_url))?;
        let client = reqwest::blocking::Client::builder()
            .user_agent("tabskel")
            .build()
            .context("build reqwest client")?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
#[path = "tests/remote/remote_tests.rs"]
mod tests;
