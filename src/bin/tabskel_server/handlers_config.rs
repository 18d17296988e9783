use super::*;

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(super) async fn get_config(State(state): State<Arc<AppState>>) -> Json<BackendConfig> {
    Json(state.settings.read().await.public())
}

/// Applies a partial update, persists it, and reports the result. An empty
/// string clears an optional LLM setting.
pub(super) async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<BackendConfig>, Response> {
    let mut settings = state.settings.write().await;
    let mut next = settings.clone();

    if let Some(root_dir) = update.root_dir {
        let path = PathBuf::from(root_dir.trim());
        if !path.is_dir() {
            return Err(bad_request(anyhow::anyhow!(
                "root_dir does not exist: {}",
                path.display()
            )));
        }
        next.root_dir = path.canonicalize().unwrap_or(path);
    }
    if let Some(v) = update.llm_base_url {
        next.llm_base_url = non_empty(v);
    }
    if let Some(v) = update.llm_model {
        next.llm_model = non_empty(v);
    }
    if let Some(v) = update.llm_api_key {
        next.llm_api_key = non_empty(v);
    }

    persist_settings(&state.data_dir, &next).map_err(internal_error)?;
    *settings = next;
    tracing::info!(root_dir = %settings.root_dir.display(), "configuration updated");
    Ok(Json(settings.public()))
}
