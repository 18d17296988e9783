//! Plain-text views of engine state.

use crate::engine::{EditOutcome, StatusSummary, Worklist};
use crate::model::{BackendConfig, Grid, Skeleton, TableListItem, TaskStatus};

const MAX_CELL: usize = 18;

fn status_mark(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::NotStarted => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Done => "[x]",
    }
}

pub(super) fn summary_line(summary: &StatusSummary) -> String {
    format!(
        "{} tasks: {} done, {} in progress, {} not started",
        summary.total(),
        summary.done,
        summary.in_progress,
        summary.not_started
    )
}

pub(super) fn render_worklist(worklist: &Worklist, current: Option<&TableListItem>) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, item) in worklist.items().iter().enumerate() {
        let cursor = if current.is_some_and(|c| c.is_key(&item.key())) {
            ">"
        } else {
            " "
        };
        lines.push(format!(
            "{}{:>3} {} {}",
            cursor,
            i,
            status_mark(item.status),
            item.key()
        ));
    }
    lines.push(summary_line(&worklist.summary()));
    lines
}

fn clip(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL {
        return cell.to_string();
    }
    let mut s: String = cell.chars().take(MAX_CELL - 1).collect();
    s.push('~');
    s
}

fn row_tags(skeleton: &Skeleton, id: crate::model::RowId) -> String {
    let mut tags = Vec::new();
    if let Some(x) = skeleton.x_row(id) {
        tags.push(format!("X:{}", x.role));
    }
    if skeleton.fe_row(id).is_some() {
        tags.push("FE".to_string());
    }
    if skeleton.obs_row(id).is_some() {
        tags.push("N".to_string());
    }
    tags.join(",")
}

/// Column widths fitted to content, with a `#` position column, the logical
/// row id and annotation tags in front of the cells.
pub(super) fn render_grid(grid: &Grid, skeleton: &Skeleton) -> Vec<String> {
    let ids = crate::engine::row_ids(grid);
    let header: Vec<String> = grid
        .header
        .iter()
        .enumerate()
        .map(|(c, h)| {
            if skeleton.y_column(c).is_some() {
                clip(&format!("{}*Y", h))
            } else {
                clip(h)
            }
        })
        .collect();
    let body: Vec<Vec<String>> = grid
        .rows
        .iter()
        .map(|r| r.iter().map(|c| clip(c)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (c, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(c) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let tag_width = ids
        .iter()
        .map(|id| row_tags(skeleton, *id).len())
        .max()
        .unwrap_or(0)
        .max(4);

    let join = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut lines = Vec::new();
    lines.push(format!(
        "{:>3} {:>5} {:<tw$} {}",
        "#",
        "id",
        "tags",
        join(&header),
        tw = tag_width
    ));
    for (pos, (row, id)) in body.iter().zip(&ids).enumerate() {
        lines.push(format!(
            "{:>3} {:>5} {:<tw$} {}",
            pos,
            id.get(),
            row_tags(skeleton, *id),
            join(row),
            tw = tag_width
        ));
    }
    lines
}

pub(super) fn render_skeleton(skeleton: &Skeleton) -> Vec<String> {
    let mut lines = vec![
        format!("status: {}", skeleton.status),
        format!("bracket default: {}", skeleton.bracket_type_default),
    ];
    for y in &skeleton.y_columns {
        lines.push(format!(
            "Y col {}: label={:?} data={:?}",
            y.col, y.depvar_label, y.depvar_data_name
        ));
    }
    for x in &skeleton.x_rows {
        lines.push(format!(
            "X row {}: {} label={:?} data={:?}",
            x.row, x.role, x.display_label, x.data_var_name
        ));
    }
    for fe in &skeleton.fe_rows {
        lines.push(format!("FE row {}: label={:?}", fe.row, fe.label));
    }
    for obs in &skeleton.obs_rows {
        lines.push(format!("Obs row {}: label={:?}", obs.row, obs.label));
    }
    for (key, bracket) in &skeleton.bracket_type_overrides {
        lines.push(format!("bracket {}: {}", key, bracket));
    }
    let notes = &skeleton.notes;
    for (kind, map) in [("row", &notes.rows), ("col", &notes.cols), ("cell", &notes.cells)] {
        for (key, text) in map {
            lines.push(format!("note {} {}: {}", kind, key, text));
        }
    }
    lines
}

/// Warnings about annotations that moved or were dropped, and rows that now
/// share an id.
pub(super) fn render_outcome(outcome: &EditOutcome) -> Vec<String> {
    let r = &outcome.rekeyed;
    let mut lines = Vec::new();
    for (old, new) in &r.moved_rows {
        lines.push(format!("warning: row annotations moved {} -> {}", old, new));
    }
    for old in &r.dropped_rows {
        lines.push(format!("warning: annotations for row {} dropped", old));
    }
    for (old, new) in &r.moved_columns {
        lines.push(format!("warning: column annotations moved {} -> {}", old, new));
    }
    for old in &r.dropped_columns {
        lines.push(format!("warning: annotations for column {} dropped", old));
    }
    for c in &outcome.collisions {
        lines.push(format!(
            "warning: rows {:?} share id {}",
            c.positions, c.id
        ));
    }
    lines
}

pub(super) fn render_config(config: &BackendConfig) -> Vec<String> {
    vec![
        format!("root_dir: {}", config.root_dir),
        format!(
            "llm_base_url: {}",
            config.llm_base_url.as_deref().unwrap_or("(default)")
        ),
        format!(
            "llm_model: {}",
            config.llm_model.as_deref().unwrap_or("(default)")
        ),
        format!("llm_key_set: {}", config.llm_key_set),
    ]
}

#[cfg(test)]
#[path = "../tests/shell/render_tests.rs"]
mod tests;
