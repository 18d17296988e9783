use std::collections::HashMap;

use axum::Json;
use serde_json::{Value, json};

use super::*;

fn touch(path: &FsPath, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn table_ids_come_from_image_names() {
    assert_eq!(table_id_for_image(FsPath::new("imgs/Paper_Table3.png")), "table3");
    assert_eq!(table_id_for_image(FsPath::new("tablet_table12_crop.jpg")), "table12");
    assert_eq!(table_id_for_image(FsPath::new("figure2.png")), "figure2");
}

#[test]
fn images_are_filtered_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("b_table2.PNG"), "png");
    touch(&dir.path().join("a_table1.jpg"), "jpg");
    touch(&dir.path().join("notes.txt"), "x");
    touch(&dir.path().join("sub/c_table3.png"), "png");

    let names: Vec<String> = table_images(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a_table1.jpg", "b_table2.PNG"]);
}

#[test]
fn llm_settings_prefer_flags_then_env_then_saved() {
    let saved = Settings {
        llm_base_url: Some("http://saved/v1".to_string()),
        llm_model: Some("saved-model".to_string()),
        llm_api_key: Some("saved-key".to_string()),
        ..Settings::default()
    };

    let resolved = resolve_llm(None, &saved, env_of(&[])).unwrap();
    assert_eq!(resolved.base_url, "http://saved/v1");
    assert_eq!(resolved.model, "saved-model");
    assert_eq!(resolved.api_key, "saved-key");

    let env = env_of(&[
        ("OPENAI_API_KEY", " "),
        ("PRE_ANNOTATOR_API_KEY", "env-key"),
        ("PRE_ANNOTATOR_BASE_URL", "http://env/v1"),
        ("PRE_ANNOTATOR_MODEL", "env-model"),
    ]);
    let resolved = resolve_llm(Some("flag-model"), &saved, env).unwrap();
    assert_eq!(resolved.api_key, "env-key");
    assert_eq!(resolved.base_url, "http://env/v1");
    assert_eq!(resolved.model, "flag-model");

    let resolved = resolve_llm(None, &Settings::default(), env_of(&[("OPENAI_API_KEY", "k")])).unwrap();
    assert_eq!(resolved.base_url, llm::DEFAULT_BASE_URL);
    assert_eq!(resolved.model, llm::DEFAULT_MODEL);

    assert!(resolve_llm(None, &Settings::default(), env_of(&[])).is_err());
}

#[test]
fn backfill_keeps_model_values_and_fills_gaps() {
    let files = TableFiles {
        paper_id: "p1".to_string(),
        table_id: "table1".to_string(),
        csv_path: PathBuf::from("out/p1_table1.csv"),
        image_path: Some(PathBuf::from("imgs/p1_table1.png")),
        skeleton_path: None,
    };
    let from_model: Skeleton =
        serde_json::from_value(json!({"table_id": "table1b", "x_rows": [{"row": 1}]})).unwrap();

    let sk = backfill_skeleton(from_model, &files);
    assert_eq!(sk.paper_id, "p1");
    assert_eq!(sk.table_id, "table1b");
    assert_eq!(sk.grid_file, "p1_table1.csv");
    assert_eq!(sk.image_file.as_deref(), Some("p1_table1.png"));
    assert_eq!(sk.status, tabskel::model::TaskStatus::InProgress);
}

async fn stand_in_chat(Json(body): Json<Value>) -> Json<Value> {
    let text = body["messages"][1]["content"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let var = if text.contains("log_wage") { "log_wage" } else { "" };
    let content = json!({
        "grid": [["row", "(1)"], ["1", "0.52***"], ["2", "1,204"]],
        "skeleton": {
            "x_rows": [{"row": 1, "display_label": "Treated", "data_var_name": var}],
            "obs_rows": [{"row": 2, "label": "Observations"}],
        },
    });
    Json(json!({"choices": [{"message": {"content": content.to_string()}}]}))
}

#[tokio::test]
async fn writes_outputs_per_image_and_skips_finished_tables() {
    let dir = tempfile::tempdir().unwrap();
    let paper_dir = dir.path().join("mnsc_2023");
    let images_dir = dir.path().join("images");
    let output_dir = dir.path().join("out");
    touch(&paper_dir.join("data/panel.csv"), "firm_id,log_wage\n");
    touch(&images_dir.join("mnsc_2023_table1.png"), "png");
    touch(&images_dir.join("mnsc_2023_table2.png"), "png");
    touch(&output_dir.join("mnsc_2023_table2.csv"), "row\n1\n");
    touch(&output_dir.join("mnsc_2023_table2.skeleton.json"), "{}");

    let app = axum::Router::new().route("/v1/chat/completions", axum::routing::post(stand_in_chat));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{}/v1", addr);
    let provider = Provider {
        base_url: &base_url,
        model: "test-model",
        api_key: "k",
    };
    let args = PreannotateArgs {
        paper_dir,
        images_dir,
        output_dir: output_dir.clone(),
        paper_id: None,
        model: None,
    };
    let report = preannotate(&reqwest::Client::new(), &provider, &args)
        .await
        .unwrap();
    assert_eq!(report.written, vec!["table1"]);
    assert_eq!(report.skipped, vec!["table2"]);
    assert!(report.failed.is_empty());

    let grid = read_grid(&output_dir.join("mnsc_2023_table1.csv")).unwrap();
    assert_eq!(grid.header, vec!["row", "(1)"]);
    assert_eq!(grid.rows[1], vec!["2", "1,204"]);

    let bytes = std::fs::read(output_dir.join("mnsc_2023_table1.skeleton.json")).unwrap();
    let sk: Skeleton = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(sk.paper_id, "mnsc_2023");
    assert_eq!(sk.grid_file, "mnsc_2023_table1.csv");
    assert_eq!(sk.x_rows[0].data_var_name, "log_wage");
    assert_eq!(sk.obs_rows[0].label, "Observations");
    assert!(sk.last_modified.is_some());

    let untouched = std::fs::read_to_string(output_dir.join("mnsc_2023_table2.csv")).unwrap();
    assert_eq!(untouched, "row\n1\n");
}

#[tokio::test]
async fn failed_tables_are_reported_and_the_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");
    touch(&images_dir.join("p_table1.png"), "png");
    touch(&images_dir.join("p_table2.png"), "png");

    let provider = Provider {
        base_url: "http://127.0.0.1:9/v1",
        model: "m",
        api_key: "k",
    };
    let args = PreannotateArgs {
        paper_dir: dir.path().join("p"),
        images_dir,
        output_dir: dir.path().join("out"),
        paper_id: Some("p".to_string()),
        model: None,
    };
    let report = preannotate(&reqwest::Client::new(), &provider, &args)
        .await
        .unwrap();
    assert_eq!(report.failed, vec!["table1", "table2"]);
    assert!(!dir.path().join("out/p_table1.csv").exists());
}
