use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use anyhow::{Result, anyhow};

use super::*;
use crate::model::TaskDetail;

#[derive(Default)]
struct FakeBackend {
    tasks: RefCell<BTreeMap<TaskKey, TaskDetail>>,
    writes: RefCell<Vec<String>>,
    fail_grid_save: Cell<bool>,
    fail_skeleton_save: Cell<bool>,
    fail_config: Cell<bool>,
    suggestion: RefCell<Option<Vec<Vec<String>>>>,
}

impl FakeBackend {
    fn with_tasks(specs: &[(&str, TaskStatus)]) -> Self {
        let backend = FakeBackend::default();
        for (table, status) in specs {
            let key = TaskKey::new("p1", *table);
            let info = TableListItem {
                paper_id: "p1".to_string(),
                table_id: table.to_string(),
                csv_path: format!("p1_{}.csv", table),
                image_path: None,
                skeleton_path: None,
                status: *status,
            };
            let grid = Grid::from_rows(vec![
                vec!["1".to_string(), "0.12".to_string(), "0.30".to_string()],
                vec!["2".to_string(), "(0.05)".to_string(), "(0.10)".to_string()],
            ]);
            let mut skeleton = Skeleton::new_for_table("p1", table, &info.csv_path, None);
            skeleton.status = *status;
            backend.tasks.borrow_mut().insert(
                key,
                TaskDetail {
                    info,
                    grid,
                    skeleton,
                },
            );
        }
        backend
    }
}

impl Backend for FakeBackend {
    fn list_tasks(&self, _root_dir: Option<&str>) -> Result<Vec<TableListItem>> {
        Ok(self
            .tasks
            .borrow()
            .values()
            .map(|d| d.info.clone())
            .collect())
    }

    fn get_task_detail(&self, key: &TaskKey, _root_dir: Option<&str>) -> Result<TaskDetail> {
        self.tasks
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("table not found"))
    }

    fn image_url(&self, key: &TaskKey, _root_dir: Option<&str>) -> String {
        format!("/image/{}", key)
    }

    fn save_grid(&self, key: &TaskKey, _root_dir: Option<&str>, grid: &Grid) -> Result<()> {
        if self.fail_grid_save.get() {
            return Err(anyhow!("disk full"));
        }
        self.writes.borrow_mut().push(format!("grid {}", key));
        if let Some(d) = self.tasks.borrow_mut().get_mut(key) {
            d.grid = grid.clone();
        }
        Ok(())
    }

    fn save_skeleton(&self, key: &TaskKey, _root_dir: Option<&str>, skeleton: &Skeleton) -> Result<()> {
        if self.fail_skeleton_save.get() {
            return Err(anyhow!("disk full"));
        }
        self.writes.borrow_mut().push(format!("skeleton {}", key));
        if let Some(d) = self.tasks.borrow_mut().get_mut(key) {
            d.skeleton = skeleton.clone();
            d.info.status = skeleton.status;
        }
        Ok(())
    }

    fn request_suggestion(
        &self,
        _key: &TaskKey,
        _root_dir: Option<&str>,
        _instruction: Option<&str>,
    ) -> Result<Vec<Vec<String>>> {
        self.suggestion
            .borrow()
            .clone()
            .ok_or_else(|| anyhow!("no API key configured"))
    }

    fn get_config(&self) -> Result<BackendConfig> {
        if self.fail_config.get() {
            return Err(anyhow!("connection refused"));
        }
        Ok(BackendConfig {
            root_dir: "/data".to_string(),
            ..BackendConfig::default()
        })
    }

    fn set_config(&self, update: &ConfigUpdate) -> Result<BackendConfig> {
        Ok(BackendConfig {
            root_dir: update.root_dir.clone().unwrap_or_default(),
            ..BackendConfig::default()
        })
    }
}

fn key(table: &str) -> TaskKey {
    TaskKey::new("p1", table)
}

fn session(specs: &[(&str, TaskStatus)]) -> Annotator<FakeBackend> {
    let mut a = Annotator::new(FakeBackend::with_tasks(specs), None);
    a.refresh_worklist().unwrap();
    a
}

fn three_tasks() -> Annotator<FakeBackend> {
    session(&[
        ("table1", TaskStatus::Done),
        ("table2", TaskStatus::NotStarted),
        ("table3", TaskStatus::InProgress),
    ])
}

#[test]
fn opened_task_starts_clean_and_read_only() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();

    let task = a.current().unwrap();
    assert!(!task.edit_mode());
    assert!(!a.is_dirty());
    assert_eq!(task.saved_grid(), &task.draft().grid);
    assert!(matches!(a.set_cell(0, 1, "x"), Err(EngineError::NotEditing)));
    assert_eq!(a.image_url().as_deref(), Some("/image/p1/table2"));
}

#[test]
fn mutations_require_an_open_task() {
    let mut a = three_tasks();
    assert!(matches!(a.set_edit_mode(true), Err(EngineError::NoOpenTask)));
    assert!(matches!(a.save(), Err(EngineError::NoOpenTask)));
    assert!(matches!(a.begin_suggestion(), Err(EngineError::NoOpenTask)));
}

#[test]
fn failed_load_keeps_current_task() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    let err = a.open(&key("missing")).unwrap_err();
    assert!(matches!(err, EngineError::Load(_)));
    assert_eq!(a.current().unwrap().key(), key("table2"));
}

#[test]
fn declined_navigation_keeps_dirty_draft() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.set_edit_mode(true).unwrap();
    a.set_cell(0, 1, "0.99").unwrap();

    let mut asked = Vec::new();
    let mut decline = |prompt: &str| {
        asked.push(prompt.to_string());
        false
    };
    let outcome = a.attempt_navigate(&key("table3"), &mut decline).unwrap();

    assert_eq!(outcome, NavigateOutcome::Declined);
    assert_eq!(asked, vec![UNSAVED_PROMPT.to_string()]);
    assert!(a.is_dirty());
    assert_eq!(a.current().unwrap().key(), key("table2"));
    assert!(a.backend().writes.borrow().is_empty());
}

#[test]
fn confirmed_navigation_saves_then_opens() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.set_edit_mode(true).unwrap();
    a.toggle_y_column(1).unwrap();

    let outcome = a
        .attempt_navigate(&key("table3"), &mut |_: &str| true)
        .unwrap();
    assert_eq!(outcome, NavigateOutcome::Opened(key("table3")));
    assert_eq!(
        *a.backend().writes.borrow(),
        vec!["grid p1/table2".to_string(), "skeleton p1/table2".to_string()]
    );
    let tasks = a.backend().tasks.borrow();
    assert!(tasks[&key("table2")].skeleton.y_column(1).is_some());
}

#[test]
fn clean_navigation_never_prompts() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    let outcome = a
        .attempt_navigate(&key("table3"), &mut |_: &str| -> bool {
            panic!("should not prompt")
        })
        .unwrap();
    assert_eq!(outcome, NavigateOutcome::Opened(key("table3")));
}

#[test]
fn failed_skeleton_write_keeps_skeleton_dirty() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.set_edit_mode(true).unwrap();
    a.set_cell(0, 1, "0.5").unwrap();
    a.toggle_y_column(2).unwrap();
    a.backend().fail_skeleton_save.set(true);

    let err = a.save().unwrap_err();
    assert!(matches!(err, EngineError::Save(_)));
    let draft = a.draft().unwrap();
    assert!(!draft.grid_dirty);
    assert!(draft.skeleton_dirty);
    assert!(draft.skeleton.y_column(2).is_some());
    assert_eq!(a.current().unwrap().saved_grid().cell(0, 1), Some("0.5"));
}

#[test]
fn failed_grid_write_skips_skeleton_write() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.set_edit_mode(true).unwrap();
    a.set_cell(0, 1, "0.5").unwrap();
    a.backend().fail_grid_save.set(true);

    assert!(a.save().is_err());
    assert!(a.draft().unwrap().grid_dirty);
    assert!(a.backend().writes.borrow().is_empty());
}

#[test]
fn save_and_advance_marks_done_and_opens_next_for_editing() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();

    let outcome = a.save_and_advance(true).unwrap();
    assert_eq!(outcome, AdvanceOutcome::Opened(key("table3")));
    assert!(a.current().unwrap().edit_mode());
    assert_eq!(
        a.worklist().get(&key("table2")).unwrap().status,
        TaskStatus::Done
    );

    let outcome = a.save_and_advance(true).unwrap();
    assert_eq!(outcome, AdvanceOutcome::NoPending);
    assert_eq!(a.worklist().summary().done, 3);
}

#[test]
fn mark_status_without_done_stays_on_task() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    let outcome = a.mark_status(TaskStatus::InProgress).unwrap();
    assert!(outcome.is_none());
    assert_eq!(a.current().unwrap().key(), key("table2"));
    assert_eq!(a.current().unwrap().info().status, TaskStatus::InProgress);
    assert!(!a.is_dirty());
}

#[test]
fn mark_status_on_clean_grid_writes_only_skeleton() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.mark_status(TaskStatus::InProgress).unwrap();
    assert_eq!(
        *a.backend().writes.borrow(),
        vec!["skeleton p1/table2".to_string()]
    );
    assert!(!a.is_dirty());
}

#[test]
fn mark_status_writes_edited_grid_first() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.set_edit_mode(true).unwrap();
    a.set_cell(0, 1, "edited").unwrap();
    a.mark_status(TaskStatus::InProgress).unwrap();
    assert_eq!(
        *a.backend().writes.borrow(),
        vec!["grid p1/table2".to_string(), "skeleton p1/table2".to_string()]
    );
}

#[test]
fn mark_done_advances_with_wrap() {
    let mut a = three_tasks();
    a.open(&key("table3")).unwrap();
    let outcome = a.mark_status(TaskStatus::Done).unwrap();
    assert_eq!(outcome, Some(AdvanceOutcome::Opened(key("table2"))));
}

#[test]
fn identity_column_cannot_be_tagged() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.set_edit_mode(true).unwrap();
    assert!(matches!(a.toggle_y_column(0), Err(EngineError::ReservedColumn)));
    assert!(matches!(
        a.toggle_y_column(3),
        Err(EngineError::OutOfRange { .. })
    ));
    assert!(!a.is_dirty());
}

#[test]
fn accepted_suggestion_replaces_grid_only() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    a.set_edit_mode(true).unwrap();
    a.toggle_x_row(RowId(1), "Treated").unwrap();
    *a.backend().suggestion.borrow_mut() = Some(vec![
        vec!["1".to_string(), "0.13".to_string()],
        vec!["2".to_string(), "(0.04)".to_string(), "extra".to_string()],
    ]);

    assert_eq!(a.request_suggestion(Some("fix OCR")).unwrap(), StageEvent::Staged);
    assert_eq!(a.draft().unwrap().grid.cell(0, 1), Some("0.12"));

    let collisions = a.accept_suggestion().unwrap();
    assert!(collisions.is_empty());
    let draft = a.draft().unwrap();
    assert_eq!(draft.grid.header, vec!["row", "c1", "c2"]);
    assert_eq!(draft.grid.cell(0, 1), Some("0.13"));
    assert!(draft.skeleton.x_row(RowId(1)).is_some());
    assert!(draft.grid_dirty);
    assert!(a.stage().is_idle());
}

#[test]
fn stale_suggestion_is_discarded_after_task_switch() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    let ticket = a.begin_suggestion().unwrap();
    a.open(&key("table3")).unwrap();
    a.set_edit_mode(true).unwrap();

    let event = a
        .complete_suggestion(&ticket, Ok(vec![vec!["1".to_string()]]))
        .unwrap();
    assert_eq!(event, StageEvent::Stale);
    assert!(matches!(a.accept_suggestion(), Err(EngineError::NothingStaged)));
    assert!(!a.is_dirty());
}

#[test]
fn failed_suggestion_leaves_draft_untouched() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    let before = a.draft().unwrap().clone();
    let err = a.request_suggestion(None).unwrap_err();
    assert!(matches!(err, EngineError::Suggestion(_)));
    assert_eq!(a.draft().unwrap(), &before);
    assert!(a.stage().is_idle());
}

#[test]
fn rejected_suggestion_is_dropped() {
    let mut a = three_tasks();
    a.open(&key("table2")).unwrap();
    *a.backend().suggestion.borrow_mut() = Some(vec![vec!["9".to_string()]]);
    a.request_suggestion(None).unwrap();
    a.reject_suggestion().unwrap();
    assert!(a.stage().is_idle());
    assert_eq!(a.draft().unwrap().grid.cell(0, 0), Some("1"));
}

#[test]
fn config_prefetch_degrades_to_defaults() {
    let mut a = three_tasks();
    a.prefetch_config();
    assert_eq!(a.config().root_dir, "/data");

    a.backend().fail_config.set(true);
    a.prefetch_config();
    assert_eq!(a.config(), &BackendConfig::default());
}
