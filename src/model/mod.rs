mod config;
mod grid;
mod ids;
mod skeleton;
mod task;

pub use self::config::{BackendConfig, ConfigUpdate};
pub use self::grid::{Grid, ROW_ID_LABEL};
pub use self::ids::{RowId, TaskKey, cell_key, parse_cell_key};
pub use self::skeleton::{
    BracketType, FeRow, NoteCollection, ObsRow, Skeleton, TaskStatus, XRole, XRow, YColumn,
};
pub use self::task::{TableListItem, TaskDetail};

#[cfg(test)]
#[path = "../tests/model/model_tests.rs"]
mod tests;
