use super::http_client::root_query;
use super::*;

#[test]
fn base_url_is_trimmed_and_validated() {
    let client = RemoteClient::new("http://127.0.0.1:8000/").unwrap();
    assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    assert_eq!(client.url("/api/projects"), "http://127.0.0.1:8000/api/projects");

    let err = RemoteClient::new("not a url").err().unwrap();
    assert!(err.to_string().contains("invalid server url"));
}

#[test]
fn root_query_is_empty_without_root() {
    assert!(root_query(None).is_empty());
    assert_eq!(
        root_query(Some("/data/tables")),
        vec![("root_dir", "/data/tables".to_string())]
    );
}

#[test]
fn image_url_carries_encoded_root() {
    let client = RemoteClient::new("http://localhost:8000").unwrap();
    assert_eq!(
        client.image_url("p1", "table1", None),
        "http://localhost:8000/api/table/p1/table1/image"
    );
    assert_eq!(
        client.image_url("p1", "table1", Some("/data/my tables")),
        "http://localhost:8000/api/table/p1/table1/image?root_dir=%2Fdata%2Fmy+tables"
    );
}

#[test]
fn retries_stop_at_first_success() {
    let mut calls = 0;
    let out = with_retries("flaky", || {
        calls += 1;
        if calls < 2 {
            anyhow::bail!("transient");
        }
        Ok(calls)
    })
    .unwrap();
    assert_eq!(out, 2);
}

#[test]
fn suggest_request_omits_missing_instruction() {
    let body = serde_json::to_string(&SuggestRequest { instruction: None }).unwrap();
    assert_eq!(body, "{}");
    let body = serde_json::to_string(&SuggestRequest {
        instruction: Some("fix signs"),
    })
    .unwrap();
    assert_eq!(body, r#"{"instruction":"fix signs"}"#);
}
