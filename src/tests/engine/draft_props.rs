use std::collections::BTreeSet;

use proptest::prelude::*;

use super::*;
use crate::engine::annotate;

#[derive(Clone, Debug)]
enum Step {
    SetCell(usize, usize, String),
    InsertRow(usize),
    RemoveRow(usize),
    InsertColumn(usize),
    RemoveColumn(usize),
    ToggleX(usize),
    ToggleFe(usize),
    ToggleObs(usize),
    ToggleY(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..6usize, 0..4usize, "[0-9a-z]{0,2}").prop_map(|(r, c, v)| Step::SetCell(r, c, v)),
        (0..7usize).prop_map(Step::InsertRow),
        (0..6usize).prop_map(Step::RemoveRow),
        (0..5usize).prop_map(Step::InsertColumn),
        (0..5usize).prop_map(Step::RemoveColumn),
        (0..6usize).prop_map(Step::ToggleX),
        (0..6usize).prop_map(Step::ToggleFe),
        (0..6usize).prop_map(Step::ToggleObs),
        (0..5usize).prop_map(Step::ToggleY),
    ]
}

fn toggle_row(
    d: &DraftState,
    pos: usize,
    f: fn(&Skeleton, RowId, &str) -> Skeleton,
) -> Result<DraftState, EngineError> {
    let Some(&id) = row_ids(&d.grid).get(pos) else {
        return Err(EngineError::OutOfRange {
            what: "row",
            index: pos,
            len: d.grid.height(),
        });
    };
    d.edit_skeleton(|sk| Ok(f(sk, id, "label")))
}

fn apply(d: &DraftState, step: &Step) -> Result<DraftState, EngineError> {
    match step {
        Step::SetCell(r, c, v) => d.set_cell(*r, *c, v).map(|(next, _)| next),
        Step::InsertRow(i) => d.insert_row_at(*i).map(|(next, _)| next),
        Step::RemoveRow(i) => d.remove_row(*i).map(|(next, _)| next),
        Step::InsertColumn(i) => d.insert_column_at(*i).map(|(next, _)| next),
        Step::RemoveColumn(i) => d.remove_column(*i).map(|(next, _)| next),
        Step::ToggleX(pos) => toggle_row(d, *pos, annotate::toggle_x_row),
        Step::ToggleFe(pos) => toggle_row(d, *pos, annotate::toggle_fe_row),
        Step::ToggleObs(pos) => toggle_row(d, *pos, annotate::toggle_obs_row),
        Step::ToggleY(col) if *col >= 1 && *col < d.grid.width() => {
            d.edit_skeleton(|sk| Ok(annotate::toggle_y_column(sk, *col)))
        }
        Step::ToggleY(col) => Err(EngineError::OutOfRange {
            what: "column",
            index: *col,
            len: d.grid.width(),
        }),
    }
}

fn unique<T: Ord>(items: impl IntoIterator<Item = T>) -> bool {
    let mut seen = BTreeSet::new();
    items.into_iter().all(|item| seen.insert(item))
}

proptest! {
    #[test]
    fn prop_edits_keep_grid_rectangular_and_keys_unique(
        rows in proptest::collection::vec(
            proptest::collection::vec("[0-9a-z]{0,2}", 1..4),
            0..5,
        ),
        steps in proptest::collection::vec(step(), 0..40)
    ) {
        let mut d = DraftState::from_snapshot(&Grid::from_rows(rows), &Skeleton::default());
        for step in &steps {
            if let Ok(next) = apply(&d, step) {
                d = next;
            }
            prop_assert!(d.grid.is_rectangular());
            prop_assert!(unique(d.skeleton.x_rows.iter().map(|r| r.row)));
            prop_assert!(unique(d.skeleton.fe_rows.iter().map(|r| r.row)));
            prop_assert!(unique(d.skeleton.obs_rows.iter().map(|r| r.row)));
            prop_assert!(unique(d.skeleton.y_columns.iter().map(|c| c.col)));
        }
    }
}
