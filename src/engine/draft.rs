//! Edit transactions over a task's draft.
//!
//! A [`DraftState`] is never mutated in place: every edit computes a complete
//! new state (grid, skeleton and dirty flags together) and hands it back, so
//! a failed edit leaves the caller's state exactly as it was.

use std::collections::BTreeSet;

use crate::model::{Grid, RowId, Skeleton};

use super::error::EngineError;
use super::grid_ops::{self, ColumnShift, RowShift};
use super::identity::{Collision, find_collisions, row_ids};
use super::rekey::{RekeyReport, RowRemap, duplicate_row_key, rekey_columns, rekey_rows};

/// Working copy of one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftState {
    pub grid: Grid,
    pub skeleton: Skeleton,
    pub grid_dirty: bool,
    pub skeleton_dirty: bool,
}

/// Side effects of a grid edit worth telling the user about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub rekeyed: RekeyReport,
    /// Rows sharing an id that carries no annotations.
    pub collisions: Vec<Collision>,
}

impl DraftState {
    /// Clean draft built from a fetched or saved snapshot.
    pub fn from_snapshot(grid: &Grid, skeleton: &Skeleton) -> Self {
        Self {
            grid: grid.clone().normalized(),
            skeleton: skeleton.clone().deduplicated(),
            grid_dirty: false,
            skeleton_dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.grid_dirty || self.skeleton_dirty
    }

    pub fn set_cell(
        &self,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(DraftState, EditOutcome), EngineError> {
        let grid = grid_ops::set_cell(&self.grid, row, col, value)?;
        if col != 0 {
            let next = DraftState {
                grid,
                skeleton: self.skeleton.clone(),
                grid_dirty: true,
                skeleton_dirty: self.skeleton_dirty,
            };
            return Ok((next, EditOutcome::default()));
        }
        self.commit_rows(grid, RowShift::Unchanged)
    }

    pub fn remove_row(&self, index: usize) -> Result<(DraftState, EditOutcome), EngineError> {
        let grid = grid_ops::remove_row(&self.grid, index)?;
        self.commit_rows(grid, RowShift::Removed(index))
    }

    pub fn insert_row_at(&self, index: usize) -> Result<(DraftState, EditOutcome), EngineError> {
        let grid = grid_ops::insert_row_at(&self.grid, index)?;
        self.commit_rows(grid, RowShift::Inserted(index))
    }

    pub fn remove_column(&self, index: usize) -> Result<(DraftState, EditOutcome), EngineError> {
        let grid = grid_ops::remove_column(&self.grid, index)?;
        Ok(self.commit_columns(grid, ColumnShift::Removed(index)))
    }

    pub fn insert_column_at(
        &self,
        index: usize,
    ) -> Result<(DraftState, EditOutcome), EngineError> {
        let grid = grid_ops::insert_column_at(&self.grid, index)?;
        Ok(self.commit_columns(grid, ColumnShift::Inserted(index)))
    }

    /// Applies a skeleton mutation to a copy of the draft.
    pub fn edit_skeleton(
        &self,
        f: impl FnOnce(&Skeleton) -> Result<Skeleton, EngineError>,
    ) -> Result<DraftState, EngineError> {
        let skeleton = f(&self.skeleton)?;
        Ok(DraftState {
            grid: self.grid.clone(),
            skeleton,
            grid_dirty: self.grid_dirty,
            skeleton_dirty: true,
        })
    }

    /// Replaces every row wholesale (accepted suggestion). Row annotations
    /// stay keyed as they were; shared ids are reported, not rejected.
    pub fn replace_rows(&self, rows: Vec<Vec<String>>) -> (DraftState, Vec<Collision>) {
        let grid = Grid::from_rows(rows);
        let collisions = find_collisions(&grid);
        let next = DraftState {
            grid,
            skeleton: self.skeleton.clone(),
            grid_dirty: true,
            skeleton_dirty: self.skeleton_dirty,
        };
        (next, collisions)
    }

    fn commit_rows(
        &self,
        grid: Grid,
        shift: RowShift,
    ) -> Result<(DraftState, EditOutcome), EngineError> {
        let before = row_ids(&self.grid);
        let after = row_ids(&grid);

        // Ids still resolved by some surviving row are never dropped.
        let mut surviving = BTreeSet::new();
        let mut remap = RowRemap::new();
        let mut removed = Vec::new();
        for (pos, &old) in before.iter().enumerate() {
            match shift.map(pos) {
                Some(new_pos) => {
                    let new = after[new_pos];
                    if new == old {
                        surviving.insert(old);
                    } else {
                        remap.entry(old).or_insert(Some(new));
                    }
                }
                None => removed.push(old),
            }
        }
        for old in removed {
            if !surviving.contains(&old) {
                remap.entry(old).or_insert(None);
            }
        }
        remap.retain(|old, _| !surviving.contains(old));

        // A moved annotation may land on an id that already carries one and
        // is not moving away itself. If a row resolved to that id before the
        // edit the two rows clash; otherwise the old entry is stale and goes.
        let backed: BTreeSet<RowId> = before.iter().copied().collect();
        let mut stale = Vec::new();
        for (&old, &new) in &remap {
            let Some(new) = new else { continue };
            if !self.skeleton.has_row_annotations(old)
                || remap.contains_key(&new)
                || !self.skeleton.has_row_annotations(new)
            {
                continue;
            }
            if backed.contains(&new) {
                return Err(reject_collision(&grid, new));
            }
            stale.push(new);
        }
        for id in stale {
            tracing::warn!(id = id.get(), "dropping stale row annotations");
            remap.insert(id, None);
        }

        let (skeleton, rekeyed) = rekey_rows(&self.skeleton, &remap);
        if let Some(id) = duplicate_row_key(&skeleton) {
            return Err(reject_collision(&grid, id));
        }

        let preexisting: BTreeSet<_> = find_collisions(&self.grid)
            .into_iter()
            .map(|c| c.id)
            .collect();
        let mut collisions = Vec::new();
        for collision in find_collisions(&grid) {
            if skeleton.has_row_annotations(collision.id) && !preexisting.contains(&collision.id)
            {
                return Err(reject_collision(&grid, collision.id));
            }
            collisions.push(collision);
        }

        if !rekeyed.is_empty() {
            tracing::warn!(
                moved = ?rekeyed.moved_rows,
                dropped = ?rekeyed.dropped_rows,
                "row annotations re-keyed"
            );
        }
        let skeleton_dirty = self.skeleton_dirty || skeleton != self.skeleton;
        let next = DraftState {
            grid,
            skeleton,
            grid_dirty: true,
            skeleton_dirty,
        };
        Ok((
            next,
            EditOutcome {
                rekeyed,
                collisions,
            },
        ))
    }

    fn commit_columns(&self, grid: Grid, shift: ColumnShift) -> (DraftState, EditOutcome) {
        let (skeleton, rekeyed) = rekey_columns(&self.skeleton, shift);
        if !rekeyed.is_empty() {
            tracing::warn!(
                moved = ?rekeyed.moved_columns,
                dropped = ?rekeyed.dropped_columns,
                "column annotations re-keyed"
            );
        }
        let skeleton_dirty = self.skeleton_dirty || skeleton != self.skeleton;
        let next = DraftState {
            grid,
            skeleton,
            grid_dirty: true,
            skeleton_dirty,
        };
        (
            next,
            EditOutcome {
                rekeyed,
                collisions: Vec::new(),
            },
        )
    }
}

fn reject_collision(grid: &Grid, id: RowId) -> EngineError {
    let positions: Vec<usize> = row_ids(grid)
        .into_iter()
        .enumerate()
        .filter(|&(_, r)| r == id)
        .map(|(pos, _)| pos)
        .collect();
    tracing::warn!(
        id = id.get(),
        positions = ?positions,
        "edit rejected: rows would share an annotated id"
    );
    EngineError::IdentityCollision { id, positions }
}

#[cfg(test)]
#[path = "../tests/engine/draft_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "../tests/engine/draft_props.rs"]
mod props;
