//! Task session: owns the worklist, the open task's draft and the suggestion
//! stage, and sequences every backend call.

use crate::model::{
    BackendConfig, BracketType, ConfigUpdate, Grid, RowId, Skeleton, TableListItem, TaskKey,
    TaskStatus,
};

use super::annotate::{self, AnnotationSet, NoteTarget};
use super::backend::Backend;
use super::draft::{DraftState, EditOutcome};
use super::error::EngineError;
use super::identity::{Collision, find_collisions, row_id_at};
use super::navigation::Worklist;
use super::staging::{StageEvent, SuggestionStage, SuggestionTicket};

pub const UNSAVED_PROMPT: &str = "There are unsaved changes. Save them and continue?";

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigateOutcome {
    Opened(TaskKey),
    /// The user kept the current task and its unsaved draft.
    Declined,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next pending task is open in edit mode.
    Opened(TaskKey),
    /// Every other task is done.
    NoPending,
}

/// The currently open task: last saved snapshot plus the working draft.
#[derive(Clone, Debug)]
pub struct OpenTask {
    info: TableListItem,
    saved_grid: Grid,
    saved_skeleton: Skeleton,
    draft: DraftState,
    edit_mode: bool,
}

impl OpenTask {
    pub fn key(&self) -> TaskKey {
        self.info.key()
    }

    pub fn info(&self) -> &TableListItem {
        &self.info
    }

    pub fn saved_grid(&self) -> &Grid {
        &self.saved_grid
    }

    pub fn saved_skeleton(&self) -> &Skeleton {
        &self.saved_skeleton
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }
}

pub struct Annotator<B> {
    backend: B,
    root_dir: Option<String>,
    config: BackendConfig,
    worklist: Worklist,
    current: Option<OpenTask>,
    stage: SuggestionStage,
}

impl<B: Backend> Annotator<B> {
    pub fn new(backend: B, root_dir: Option<String>) -> Self {
        Self {
            backend,
            root_dir,
            config: BackendConfig::default(),
            worklist: Worklist::default(),
            current: None,
            stage: SuggestionStage::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn root_dir(&self) -> Option<&str> {
        self.root_dir.as_deref()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn worklist(&self) -> &Worklist {
        &self.worklist
    }

    pub fn current(&self) -> Option<&OpenTask> {
        self.current.as_ref()
    }

    pub fn draft(&self) -> Option<&DraftState> {
        self.current.as_ref().map(|t| &t.draft)
    }

    pub fn stage(&self) -> &SuggestionStage {
        &self.stage
    }

    pub fn is_dirty(&self) -> bool {
        self.current.as_ref().is_some_and(|t| t.draft.is_dirty())
    }

    pub fn image_url(&self) -> Option<String> {
        self.current
            .as_ref()
            .map(|t| self.backend.image_url(&t.key(), self.root_dir()))
    }

    pub fn row_id_at(&self, position: usize) -> Option<RowId> {
        self.current
            .as_ref()
            .and_then(|t| row_id_at(&t.draft.grid, position))
    }

    /// Loads the backend configuration. Failures fall back to defaults.
    pub fn prefetch_config(&mut self) {
        match self.backend.get_config() {
            Ok(cfg) => self.config = cfg,
            Err(err) => {
                tracing::debug!(error = %format!("{:#}", err), "config prefetch failed; using defaults");
                self.config = BackendConfig::default();
            }
        }
    }

    pub fn update_config(&mut self, update: &ConfigUpdate) -> Result<&BackendConfig, EngineError> {
        self.config = self.backend.set_config(update).map_err(EngineError::Save)?;
        Ok(&self.config)
    }

    pub fn refresh_worklist(&mut self) -> Result<&Worklist, EngineError> {
        let items = self
            .backend
            .list_tasks(self.root_dir.as_deref())
            .map_err(EngineError::Load)?;
        self.worklist = Worklist::new(items);
        tracing::debug!(tasks = self.worklist.len(), "worklist refreshed");
        Ok(&self.worklist)
    }

    /// Next not-done task after the open one.
    pub fn find_next(&self) -> Option<&TableListItem> {
        let key = self.current.as_ref()?.key();
        self.worklist.find_next(&key)
    }

    /// Opens `key`, unconditionally replacing the current draft. Use
    /// [`Annotator::attempt_navigate`] to protect unsaved edits.
    pub fn open(&mut self, key: &TaskKey) -> Result<(), EngineError> {
        let detail = self
            .backend
            .get_task_detail(key, self.root_dir.as_deref())
            .map_err(EngineError::Load)?;
        let draft = DraftState::from_snapshot(&detail.grid, &detail.skeleton);
        for collision in find_collisions(&draft.grid) {
            tracing::warn!(
                task = %key,
                id = collision.id.get(),
                positions = ?collision.positions,
                "rows share a logical id"
            );
        }
        self.current = Some(OpenTask {
            info: detail.info,
            saved_grid: draft.grid.clone(),
            saved_skeleton: draft.skeleton.clone(),
            draft,
            edit_mode: false,
        });
        self.stage.reset();
        tracing::info!(task = %key, "opened task");
        Ok(())
    }

    /// Moves to `target`. With unsaved changes the user must confirm; the
    /// draft is then saved first and a failed save keeps the current task.
    pub fn attempt_navigate(
        &mut self,
        target: &TaskKey,
        confirm: &mut impl Confirm,
    ) -> Result<NavigateOutcome, EngineError> {
        if self.is_dirty() {
            if !confirm.confirm(UNSAVED_PROMPT) {
                tracing::info!(target = %target, "navigation declined; keeping draft");
                return Ok(NavigateOutcome::Declined);
            }
            self.save()?;
        }
        self.open(target)?;
        Ok(NavigateOutcome::Opened(target.clone()))
    }

    /// Writes grid then skeleton. Each dirty flag clears only once its write
    /// has succeeded.
    pub fn save(&mut self) -> Result<(), EngineError> {
        self.write_task(true)
    }

    /// Like [`save`](Self::save), but the grid is written only when it has
    /// unsaved edits.
    fn write_task(&mut self, always_grid: bool) -> Result<(), EngineError> {
        let root_dir = self.root_dir.as_deref();
        let task = self.current.as_mut().ok_or(EngineError::NoOpenTask)?;
        let key = task.info.key();

        if always_grid || task.draft.grid_dirty {
            self.backend
                .save_grid(&key, root_dir, &task.draft.grid)
                .map_err(EngineError::Save)?;
            task.saved_grid = task.draft.grid.clone();
            task.draft.grid_dirty = false;
        }

        self.backend
            .save_skeleton(&key, root_dir, &task.draft.skeleton)
            .map_err(EngineError::Save)?;
        task.saved_skeleton = task.draft.skeleton.clone();
        task.draft.skeleton_dirty = false;

        let status = task.draft.skeleton.status;
        task.info.status = status;
        self.worklist.set_status(&key, status);
        tracing::info!(task = %key, status = %status, "saved task");
        Ok(())
    }

    /// Saves (optionally marking the task done), refreshes the worklist and
    /// opens the next pending task in edit mode.
    pub fn save_and_advance(&mut self, mark_done: bool) -> Result<AdvanceOutcome, EngineError> {
        if mark_done {
            self.update_skeleton(|s| Ok(annotate::set_status(s, TaskStatus::Done)))?;
        }
        self.save()?;
        self.advance()
    }

    /// Saves with the given status; `done` also advances to the next task.
    pub fn mark_status(
        &mut self,
        status: TaskStatus,
    ) -> Result<Option<AdvanceOutcome>, EngineError> {
        self.update_skeleton(|s| Ok(annotate::set_status(s, status)))?;
        self.write_task(false)?;
        if status == TaskStatus::Done {
            return self.advance().map(Some);
        }
        if let Err(err) = self.refresh_worklist() {
            tracing::warn!(error = %err, "worklist refresh failed; keeping cached list");
        }
        Ok(None)
    }

    fn advance(&mut self) -> Result<AdvanceOutcome, EngineError> {
        let key = self
            .current
            .as_ref()
            .ok_or(EngineError::NoOpenTask)?
            .key();
        if let Err(err) = self.refresh_worklist() {
            tracing::warn!(error = %err, "worklist refresh failed; keeping cached list");
        }
        let Some(next) = self.worklist.find_next(&key).map(|t| t.key()) else {
            tracing::info!(task = %key, "no pending tasks left");
            return Ok(AdvanceOutcome::NoPending);
        };
        self.open(&next)?;
        if let Some(task) = self.current.as_mut() {
            task.edit_mode = true;
        }
        Ok(AdvanceOutcome::Opened(next))
    }

    pub fn set_edit_mode(&mut self, on: bool) -> Result<(), EngineError> {
        let task = self.current.as_mut().ok_or(EngineError::NoOpenTask)?;
        task.edit_mode = on;
        Ok(())
    }

    fn editing(&mut self) -> Result<&mut OpenTask, EngineError> {
        let task = self.current.as_mut().ok_or(EngineError::NoOpenTask)?;
        if !task.edit_mode {
            return Err(EngineError::NotEditing);
        }
        Ok(task)
    }

    fn edit_grid(
        &mut self,
        f: impl FnOnce(&DraftState) -> Result<(DraftState, EditOutcome), EngineError>,
    ) -> Result<EditOutcome, EngineError> {
        let task = self.editing()?;
        let (next, outcome) = f(&task.draft)?;
        task.draft = next;
        Ok(outcome)
    }

    fn edit_skeleton(
        &mut self,
        f: impl FnOnce(&Skeleton) -> Result<Skeleton, EngineError>,
    ) -> Result<(), EngineError> {
        self.editing()?;
        self.update_skeleton(f)
    }

    fn update_skeleton(
        &mut self,
        f: impl FnOnce(&Skeleton) -> Result<Skeleton, EngineError>,
    ) -> Result<(), EngineError> {
        let task = self.current.as_mut().ok_or(EngineError::NoOpenTask)?;
        task.draft = task.draft.edit_skeleton(f)?;
        Ok(())
    }

    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<EditOutcome, EngineError> {
        tracing::debug!(row, col, "set cell");
        self.edit_grid(|d| d.set_cell(row, col, value))
    }

    pub fn remove_row(&mut self, index: usize) -> Result<EditOutcome, EngineError> {
        tracing::debug!(index, "remove row");
        self.edit_grid(|d| d.remove_row(index))
    }

    pub fn insert_row_at(&mut self, index: usize) -> Result<EditOutcome, EngineError> {
        tracing::debug!(index, "insert row");
        self.edit_grid(|d| d.insert_row_at(index))
    }

    pub fn remove_column(&mut self, index: usize) -> Result<EditOutcome, EngineError> {
        tracing::debug!(index, "remove column");
        self.edit_grid(|d| d.remove_column(index))
    }

    pub fn insert_column_at(&mut self, index: usize) -> Result<EditOutcome, EngineError> {
        tracing::debug!(index, "insert column");
        self.edit_grid(|d| d.insert_column_at(index))
    }

    pub fn toggle_y_column(&mut self, col: usize) -> Result<(), EngineError> {
        let width = self.editing()?.draft.grid.width();
        if col == 0 {
            return Err(EngineError::ReservedColumn);
        }
        if col >= width {
            return Err(EngineError::OutOfRange {
                what: "column",
                index: col,
                len: width,
            });
        }
        self.edit_skeleton(|s| Ok(annotate::toggle_y_column(s, col)))
    }

    pub fn toggle_x_row(&mut self, row: RowId, default_label: &str) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::toggle_x_row(s, row, default_label)))
    }

    pub fn set_core_row(&mut self, row: RowId, default_label: &str) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::set_core_row(s, row, default_label)))
    }

    pub fn toggle_fe_row(&mut self, row: RowId, label: &str) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::toggle_fe_row(s, row, label)))
    }

    pub fn toggle_obs_row(&mut self, row: RowId, label: &str) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::toggle_obs_row(s, row, label)))
    }

    pub fn update_field(
        &mut self,
        set: AnnotationSet,
        key: i64,
        field: &str,
        value: &str,
    ) -> Result<(), EngineError> {
        self.edit_skeleton(|s| annotate::update_field(s, set, key, field, value))
    }

    pub fn set_bracket_default(&mut self, bracket: BracketType) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::set_bracket_default(s, bracket)))
    }

    pub fn set_bracket_override(
        &mut self,
        row: RowId,
        col: usize,
        bracket: Option<BracketType>,
    ) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::set_bracket_override(s, row, col, bracket)))
    }

    pub fn set_note(&mut self, target: NoteTarget, value: &str) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::set_note(s, target, value)))
    }

    pub fn set_status(&mut self, status: TaskStatus) -> Result<(), EngineError> {
        self.edit_skeleton(|s| Ok(annotate::set_status(s, status)))
    }

    /// Requests a replacement grid and stages it. Blocks until the provider
    /// answers.
    pub fn request_suggestion(
        &mut self,
        instruction: Option<&str>,
    ) -> Result<StageEvent, EngineError> {
        let ticket = self.begin_suggestion()?;
        let result =
            self.backend
                .request_suggestion(&ticket.task, self.root_dir.as_deref(), instruction);
        self.complete_suggestion(&ticket, result)
    }

    /// First half of [`Annotator::request_suggestion`] for callers that run
    /// the provider call themselves.
    pub fn begin_suggestion(&mut self) -> Result<SuggestionTicket, EngineError> {
        let key = self
            .current
            .as_ref()
            .ok_or(EngineError::NoOpenTask)?
            .key();
        tracing::info!(task = %key, "requesting suggestion");
        Ok(self.stage.begin(&key))
    }

    pub fn complete_suggestion(
        &mut self,
        ticket: &SuggestionTicket,
        result: anyhow::Result<Vec<Vec<String>>>,
    ) -> Result<StageEvent, EngineError> {
        let open = self.current.as_ref().map(|t| t.key());
        self.stage.complete(ticket, open.as_ref(), result)
    }

    /// Replaces the grid draft with the staged rows.
    pub fn accept_suggestion(&mut self) -> Result<Vec<Collision>, EngineError> {
        let task = self.current.as_mut().ok_or(EngineError::NoOpenTask)?;
        if !task.edit_mode {
            return Err(EngineError::NotEditing);
        }
        let rows = self.stage.take_for_accept()?;
        let (next, collisions) = task.draft.replace_rows(rows);
        task.draft = next;
        for c in &collisions {
            tracing::warn!(id = c.id.get(), positions = ?c.positions, "accepted rows share a logical id");
        }
        Ok(collisions)
    }

    pub fn reject_suggestion(&mut self) -> Result<(), EngineError> {
        self.stage.reject()
    }
}

#[cfg(test)]
#[path = "../tests/engine/session_tests.rs"]
mod tests;
