use super::*;

#[test]
fn rows_object_is_accepted() {
    let rows = parse_rows(r#"{"rows": [["1", 0.5, null], ["2", "x"]]}"#).unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["1".to_string(), "0.5".to_string(), String::new()],
            vec!["2".to_string(), "x".to_string()],
        ]
    );
}

#[test]
fn grid_key_and_bare_arrays_are_accepted() {
    assert_eq!(parse_rows(r#"{"grid": [["1"]]}"#).unwrap(), vec![vec!["1".to_string()]]);
    assert_eq!(parse_rows(r#"[["1", 2]]"#).unwrap()[0][1], "2");
}

#[test]
fn code_fences_are_stripped() {
    let reply = "```json\n{\"rows\": [[\"1\", \"99\"]]}\n```";
    assert_eq!(parse_rows(reply).unwrap()[0], vec!["1", "99"]);
}

#[test]
fn malformed_replies_are_errors() {
    assert!(parse_rows("sure, here is the table").is_err());
    assert!(parse_rows(r#"{"table": []}"#).is_err());
    assert!(parse_rows(r#"{"rows": [1, 2]}"#).is_err());
    assert!(parse_rows("42").is_err());
}

#[test]
fn request_carries_image_and_instruction() {
    let input = SuggestInput {
        paper_id: "p1",
        table_id: "table1",
        csv: "row,c1\n1,0.5\n",
        image_data_url: Some("data:image/png;base64,AQID".to_string()),
        instruction: Some("merge split rows"),
    };
    let body = build_request("gpt-4o", &input);
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["temperature"], 0);
    let content = &body["messages"][1]["content"];
    assert!(content[0]["text"].as_str().unwrap().contains("merge split rows"));
    assert!(content[0]["text"].as_str().unwrap().ends_with("1,0.5\n"));
    assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,AQID");
}

#[test]
fn preannotation_reply_carries_grid_and_skeleton() {
    let reply = "```json\n{\"grid\": [[\"row\", \"(1)\"], [\"1\", 0.5]], \"skeleton\": {\"x_rows\": [{\"row\": 1}]}}\n```";
    let parsed = parse_preannotation(reply).unwrap();
    assert_eq!(parsed.rows[1], vec!["1", "0.5"]);
    assert_eq!(parsed.skeleton["x_rows"][0]["row"], 1);

    let bare = parse_preannotation(r#"{"rows": [["row"]]}"#).unwrap();
    assert!(bare.skeleton.as_object().unwrap().is_empty());

    assert!(parse_preannotation(r#"[["row"]]"#).is_err());
    assert!(parse_preannotation(r#"{"grid": [], "skeleton": [1]}"#).is_err());
}

#[test]
fn preannotate_prompt_lists_candidates_and_pdf_snippet() {
    let columns = vec!["log_wage".to_string(), "firm_id".to_string()];
    let code_vars = vec!["treated".to_string()];
    let pdf = "p".repeat(5000);
    let input = PreannotateInput {
        paper_id: "p1",
        table_id: "table2",
        image_data_url: "data:image/png;base64,AAAA".to_string(),
        pdf_text: &pdf,
        candidate_columns: &columns,
        candidate_code_vars: &code_vars,
    };
    let prompt = build_preannotate_prompt(&input);
    assert!(prompt.contains("Paper id: p1, table id: table2."));
    assert!(prompt.contains("Candidate dataset columns (partial): log_wage, firm_id"));
    assert!(prompt.contains("Candidate variable names from code (partial): treated"));
    assert!(prompt.ends_with(&"p".repeat(4000)));
    assert!(!prompt.contains(&"p".repeat(4001)));

    let request = build_preannotate_request("gpt-4o", &input);
    assert_eq!(request["messages"][1]["content"][1]["image_url"]["url"], "data:image/png;base64,AAAA");
}
