use super::llm::{self, Provider, SuggestInput};
use super::*;

#[derive(Debug, Default, serde::Deserialize)]
pub(super) struct RootQuery {
    #[serde(default)]
    root_dir: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(super) struct SuggestBody {
    #[serde(default)]
    instruction: Option<String>,
}

async fn resolve_root(state: &AppState, q: &RootQuery) -> Result<PathBuf, Response> {
    let root = match q.root_dir.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(r) => PathBuf::from(r),
        None => state.settings.read().await.root_dir.clone(),
    };
    if !root.is_dir() {
        return Err(bad_request(anyhow::anyhow!(
            "root_dir does not exist: {}",
            root.display()
        )));
    }
    Ok(root)
}

async fn find_table(
    state: &AppState,
    q: &RootQuery,
    paper_id: &str,
    table_id: &str,
) -> Result<TableFiles, Response> {
    let root = resolve_root(state, q).await?;
    match locate_table(&root, paper_id, table_id) {
        Ok(Some(files)) => Ok(files),
        Ok(None) => Err(not_found("table")),
        Err(err) => Err(internal_error(err)),
    }
}

pub(super) async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RootQuery>,
) -> Result<Json<Vec<TableListItem>>, Response> {
    let root = resolve_root(&state, &q).await?;
    let tables = scan_tables(&root).map_err(internal_error)?;
    Ok(Json(tables))
}

pub(super) async fn get_table(
    State(state): State<Arc<AppState>>,
    Path((paper_id, table_id)): Path<(String, String)>,
    Query(q): Query<RootQuery>,
) -> Result<Json<TaskDetail>, Response> {
    let files = find_table(&state, &q, &paper_id, &table_id).await?;
    let grid = read_grid(&files.csv_path).map_err(internal_error)?;
    let skeleton = load_skeleton(&files);
    let info = files.list_item(skeleton.status);
    Ok(Json(TaskDetail {
        info,
        grid,
        skeleton,
    }))
}

pub(super) async fn save_csv(
    State(state): State<Arc<AppState>>,
    Path((paper_id, table_id)): Path<(String, String)>,
    Query(q): Query<RootQuery>,
    Json(grid): Json<Grid>,
) -> Result<Json<serde_json::Value>, Response> {
    let files = find_table(&state, &q, &paper_id, &table_id).await?;
    write_grid(&files.csv_path, &grid).map_err(internal_error)?;
    tracing::info!(paper_id = %paper_id, table_id = %table_id, rows = grid.rows.len(), "saved grid");
    Ok(Json(serde_json::json!({
        "ok": true,
        "csv_path": files.csv_path.display().to_string(),
    })))
}

pub(super) async fn save_skeleton_handler(
    State(state): State<Arc<AppState>>,
    Path((paper_id, table_id)): Path<(String, String)>,
    Query(q): Query<RootQuery>,
    Json(skeleton): Json<Skeleton>,
) -> Result<Json<serde_json::Value>, Response> {
    let files = find_table(&state, &q, &paper_id, &table_id).await?;
    let path = save_skeleton(&files, &skeleton).map_err(internal_error)?;
    tracing::info!(paper_id = %paper_id, table_id = %table_id, status = %skeleton.status, "saved skeleton");
    Ok(Json(serde_json::json!({
        "ok": true,
        "skeleton_path": path.display().to_string(),
    })))
}

pub(super) async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((paper_id, table_id)): Path<(String, String)>,
    Query(q): Query<RootQuery>,
) -> Result<Response, Response> {
    let files = find_table(&state, &q, &paper_id, &table_id).await?;
    let Some(path) = files.image_path else {
        return Err(not_found("image"));
    };
    let bytes = std::fs::read(&path)
        .with_context(|| format!("read {}", path.display()))
        .map_err(internal_error)?;
    Ok((
        [(header::CONTENT_TYPE, image_content_type(&path))],
        axum::body::Bytes::from(bytes),
    )
        .into_response())
}

pub(super) async fn suggest(
    State(state): State<Arc<AppState>>,
    Path((paper_id, table_id)): Path<(String, String)>,
    Query(q): Query<RootQuery>,
    Json(body): Json<SuggestBody>,
) -> Result<Json<serde_json::Value>, Response> {
    let files = find_table(&state, &q, &paper_id, &table_id).await?;
    let settings = state.settings.read().await.clone();
    let Some(api_key) = settings.llm_api_key.as_deref() else {
        return Err(bad_request(anyhow::anyhow!(
            "no LLM API key configured (set OPENAI_API_KEY or POST /api/config)"
        )));
    };

    let csv = std::fs::read_to_string(&files.csv_path)
        .with_context(|| format!("read {}", files.csv_path.display()))
        .map_err(internal_error)?;
    let image_data_url = match &files.image_path {
        Some(path) => Some(image_data_url(path).map_err(internal_error)?),
        None => None,
    };

    let provider = Provider {
        base_url: settings.llm_base_url.as_deref().unwrap_or(llm::DEFAULT_BASE_URL),
        model: settings.llm_model.as_deref().unwrap_or(llm::DEFAULT_MODEL),
        api_key,
    };
    let input = SuggestInput {
        paper_id: &paper_id,
        table_id: &table_id,
        csv: &csv,
        image_data_url,
        instruction: body.instruction.as_deref(),
    };
    tracing::info!(paper_id = %paper_id, table_id = %table_id, model = provider.model, "requesting suggestion");
    let rows = llm::request_rows(&state.http, &provider, &input)
        .await
        .map_err(bad_gateway)?;
    Ok(Json(serde_json::json!({"rows": rows})))
}
