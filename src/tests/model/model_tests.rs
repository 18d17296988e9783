use super::*;

fn s(v: &str) -> String {
    v.to_string()
}

#[test]
fn normalized_pads_rows_and_extends_header() {
    let grid = Grid::new(
        vec![s("row"), s("c1")],
        vec![vec![s("1"), s("a"), s("b")], vec![s("2")]],
    )
    .normalized();

    assert_eq!(grid.header, vec![s("row"), s("c1"), s("c2")]);
    assert_eq!(grid.rows[1], vec![s("2"), s(""), s("")]);
    assert!(grid.is_rectangular());
}

#[test]
fn normalized_keeps_identity_column_on_empty_grid() {
    let grid = Grid::default().normalized();
    assert_eq!(grid.header, vec![s("row")]);
    assert!(grid.rows.is_empty());
}

#[test]
fn from_rows_derives_synthetic_header() {
    let grid = Grid::from_rows(vec![vec![s("1"), s("99")]]);
    assert_eq!(grid.header, vec![s("row"), s("c1")]);
    assert_eq!(grid.rows, vec![vec![s("1"), s("99")]]);
}

#[test]
fn cell_keys_parse_back() {
    let key = cell_key(RowId(7), 3);
    assert_eq!(key, "7:3");
    assert_eq!(parse_cell_key(&key), Some((RowId(7), 3)));
    assert_eq!(parse_cell_key("x:3"), None);
    assert_eq!(parse_cell_key("7"), None);
}

#[test]
fn skeleton_tolerates_nulls_and_missing_fields() {
    let raw = serde_json::json!({
        "paper_id": "p1",
        "table_id": "table1",
        "grid_file": "p1_table1.csv",
        "status": "done",
        "y_columns": [{"col": 2, "depvar_label": null}],
        "x_rows": [{"row": 4, "display_label": "Treated", "data_var_name": null}],
        "fe_rows": [{"row": 9, "label": "Firm FE"}],
        "obs_rows": []
    });
    let sk: Skeleton = serde_json::from_value(raw).unwrap();

    assert_eq!(sk.status, TaskStatus::Done);
    assert_eq!(sk.bracket_type_default, BracketType::Unknown);
    assert_eq!(sk.y_columns[0].depvar_label, "");
    assert_eq!(sk.x_rows[0].role, XRole::Key);
    assert_eq!(sk.fe_rows[0].row, RowId(9));
    assert!(sk.notes.cells.is_empty());
}

#[test]
fn skeleton_status_defaults_to_in_progress_when_absent() {
    let sk: Skeleton = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(sk.status, TaskStatus::InProgress);
}

#[test]
fn row_annotations_include_cell_keyed_entries() {
    let mut sk = Skeleton::default();
    assert!(!sk.has_row_annotations(RowId(3)));

    sk.bracket_type_overrides
        .insert(cell_key(RowId(3), 2), BracketType::StdErr);
    assert!(sk.has_row_annotations(RowId(3)));
    assert!(!sk.has_row_annotations(RowId(2)));
}

#[test]
fn deduplicated_keeps_first_entry_per_key() {
    let mut sk = Skeleton::default();
    sk.y_columns.push(YColumn {
        col: 1,
        depvar_label: s("first"),
        ..YColumn::default()
    });
    sk.y_columns.push(YColumn {
        col: 1,
        depvar_label: s("second"),
        ..YColumn::default()
    });

    let sk = sk.deduplicated();
    assert_eq!(sk.y_columns.len(), 1);
    assert_eq!(sk.y_columns[0].depvar_label, "first");
}

#[test]
fn status_round_trips_through_strings() {
    for status in [TaskStatus::NotStarted, TaskStatus::InProgress, TaskStatus::Done] {
        assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
    }
    assert!("finished".parse::<TaskStatus>().is_err());
}
