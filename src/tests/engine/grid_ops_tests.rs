use super::*;

fn s(v: &str) -> String {
    v.to_string()
}

fn one_row_grid() -> Grid {
    Grid::new(
        vec![s("row"), s("c1"), s("c2")],
        vec![vec![s("1"), s("10"), s("20")]],
    )
}

#[test]
fn insert_column_shifts_cells_right_and_rebuilds_header() {
    let before = one_row_grid();
    let after = insert_column_at(&before, 2).unwrap();

    assert_eq!(after.header, vec![s("row"), s("c1"), s("c2"), s("c3")]);
    assert_eq!(after.rows[0], vec![s("1"), s("10"), s(""), s("20")]);
    assert_eq!(before, one_row_grid());
}

#[test]
fn insert_column_at_width_appends() {
    let after = insert_column_at(&one_row_grid(), 3).unwrap();
    assert_eq!(after.rows[0], vec![s("1"), s("10"), s("20"), s("")]);
    assert!(matches!(
        insert_column_at(&one_row_grid(), 4),
        Err(EngineError::OutOfRange { what: "column", .. })
    ));
}

#[test]
fn identity_column_is_reserved() {
    assert!(matches!(
        remove_column(&one_row_grid(), 0),
        Err(EngineError::ReservedColumn)
    ));
    assert!(matches!(
        insert_column_at(&one_row_grid(), 0),
        Err(EngineError::ReservedColumn)
    ));
}

#[test]
fn remove_column_renumbers_header() {
    let after = remove_column(&one_row_grid(), 1).unwrap();
    assert_eq!(after.header, vec![s("row"), s("c1")]);
    assert_eq!(after.rows[0], vec![s("1"), s("20")]);
    assert!(after.is_rectangular());
}

#[test]
fn row_insert_and_remove_respect_bounds() {
    let g = one_row_grid();
    let appended = insert_row_at(&g, 1).unwrap();
    assert_eq!(appended.height(), 2);
    assert_eq!(appended.rows[1], vec![s(""), s(""), s("")]);

    let prepended = insert_row_at(&g, 0).unwrap();
    assert_eq!(prepended.rows[1], g.rows[0]);

    assert!(insert_row_at(&g, 2).is_err());
    assert!(remove_row(&g, 1).is_err());
    assert_eq!(remove_row(&g, 0).unwrap().height(), 0);
}

#[test]
fn set_cell_checks_both_axes() {
    let g = one_row_grid();
    assert_eq!(set_cell(&g, 0, 2, "x").unwrap().cell(0, 2), Some("x"));
    assert!(set_cell(&g, 0, 3, "x").is_err());
    assert!(set_cell(&g, 1, 0, "x").is_err());
    assert_eq!(g.cell(0, 2), Some("20"));
}

#[test]
fn shifts_map_positions() {
    assert_eq!(RowShift::Removed(1).map(0), Some(0));
    assert_eq!(RowShift::Removed(1).map(1), None);
    assert_eq!(RowShift::Removed(1).map(2), Some(1));
    assert_eq!(RowShift::Inserted(1).map(1), Some(2));
    assert_eq!(RowShift::Unchanged.map(5), Some(5));
    assert_eq!(ColumnShift::Inserted(2).map(1), Some(1));
    assert_eq!(ColumnShift::Inserted(2).map(2), Some(3));
    assert_eq!(ColumnShift::Removed(2).map(2), None);
}

#[test]
fn row_edits_keep_loaded_header() {
    let before = Grid::new(
        vec![s("row"), s("Mean"), s("SD")],
        vec![vec![s("1"), s("10"), s("20")], vec![s("2"), s("11"), s("21")]],
    );
    let inserted = insert_row_at(&before, 1).unwrap();
    assert_eq!(inserted.header, before.header);
    assert_eq!(inserted.rows[1], vec![s(""), s(""), s("")]);

    let removed = remove_row(&before, 0).unwrap();
    assert_eq!(removed.header, before.header);

    let widened = insert_column_at(&before, 1).unwrap();
    assert_eq!(widened.header, vec![s("row"), s("c1"), s("c2"), s("c3")]);
}
