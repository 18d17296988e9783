use super::*;

pub(super) fn with_retries<T>(label: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
    const ATTEMPTS: usize = 3;
    let mut last: Option<anyhow::Error> = None;
    for i in 0..ATTEMPTS {
        match f() {
            Ok(v) => return Ok(v),
            Err(err) => {
                tracing::debug!(attempt = i + 1, error = %format!("{:#}", err), "{} failed", label);
                last = Some(err);
                if i + 1 < ATTEMPTS {
                    std::thread::sleep(std::time::Duration::from_millis(200 * (1 << i)));
                }
            }
        }
    }
    Err(last
        .unwrap_or_else(|| anyhow::anyhow!("unknown error"))
        .context(label.to_string()))
}

/// `root_dir` query pair, when one is set.
pub(super) fn root_query(root_dir: Option<&str>) -> Vec<(&'static str, String)> {
    root_dir
        .map(|r| vec![("root_dir", r.to_string())])
        .unwrap_or_default()
}

impl RemoteClient {
    /// Turns a non-2xx response into an error carrying the server's
    /// `{"error": ...}` message when there is one.
    pub(super) fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        label: &str,
    ) -> Result<reqwest::blocking::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(e) => anyhow::bail!("{}: {} ({})", label, e.error, status),
            Err(_) if status == reqwest::StatusCode::NOT_FOUND => {
                anyhow::bail!("{}: endpoint not found (is tabskel-server running?)", label)
            }
            Err(_) => anyhow::bail!("{}: {}", label, status),
        }
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
