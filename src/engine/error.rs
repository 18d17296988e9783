use thiserror::Error;

use crate::model::RowId;

/// Every failure the annotation engine reports to its caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Worklist or task detail could not be fetched; no draft was created.
    #[error("load failed: {0:#}")]
    Load(anyhow::Error),

    /// Grid or skeleton write failed; the draft and its dirty flags are kept.
    #[error("save failed: {0:#}")]
    Save(anyhow::Error),

    /// Suggestion provider failed; the draft is untouched.
    #[error("suggestion failed: {0:#}")]
    Suggestion(anyhow::Error),

    #[error("rows at positions {positions:?} would share annotated row id {id}")]
    IdentityCollision { id: RowId, positions: Vec<usize> },

    #[error("column 0 holds row ids and cannot be removed, inserted before, or annotated")]
    ReservedColumn,

    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("no task is open")]
    NoOpenTask,

    #[error("task is not in edit mode")]
    NotEditing,

    #[error("no suggestion is staged")]
    NothingStaged,

    #[error("field '{field}' does not exist on {set}")]
    InvalidField { set: &'static str, field: String },

    #[error("{0}")]
    InvalidValue(String),
}
