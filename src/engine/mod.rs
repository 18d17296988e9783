//! Client-side annotation state engine.

mod annotate;
mod backend;
mod draft;
mod error;
mod grid_ops;
mod identity;
mod navigation;
mod rekey;
mod session;
mod staging;

pub use self::annotate::{AnnotationSet, NoteTarget};
pub use self::backend::Backend;
pub use self::draft::{DraftState, EditOutcome};
pub use self::error::EngineError;
pub use self::identity::{Collision, RowIdentity, find_collisions, parse_leading_int, row_ids};
pub use self::navigation::{StatusSummary, Worklist};
pub use self::rekey::RekeyReport;
pub use self::session::{
    AdvanceOutcome, Annotator, Confirm, NavigateOutcome, OpenTask, UNSAVED_PROMPT,
};
pub use self::staging::{StageEvent, StageState, SuggestionStage, SuggestionTicket};
