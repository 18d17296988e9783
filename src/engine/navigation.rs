//! Ordered task worklist.

use crate::model::{TableListItem, TaskKey, TaskStatus};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub not_started: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusSummary {
    pub fn total(&self) -> usize {
        self.not_started + self.in_progress + self.done
    }
}

/// Tasks sorted by (paper id, table id).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Worklist {
    items: Vec<TableListItem>,
}

impl Worklist {
    pub fn new(mut items: Vec<TableListItem>) -> Self {
        items.sort_by(|a, b| {
            a.paper_id
                .cmp(&b.paper_id)
                .then_with(|| a.table_id.cmp(&b.table_id))
        });
        Self { items }
    }

    pub fn items(&self) -> &[TableListItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, key: &TaskKey) -> Option<usize> {
        self.items.iter().position(|t| t.is_key(key))
    }

    pub fn get(&self, key: &TaskKey) -> Option<&TableListItem> {
        self.items.iter().find(|t| t.is_key(key))
    }

    /// First not-done task after `after`, wrapping around to the start of the
    /// list; `after` itself is never returned. An unknown `after` scans from
    /// the beginning.
    pub fn find_next(&self, after: &TaskKey) -> Option<&TableListItem> {
        let start = self.position(after).map(|i| i + 1).unwrap_or(0);
        self.items[start..]
            .iter()
            .find(|t| t.status != TaskStatus::Done)
            .or_else(|| {
                self.items
                    .iter()
                    .find(|t| t.status != TaskStatus::Done && !t.is_key(after))
            })
    }

    pub fn set_status(&mut self, key: &TaskKey, status: TaskStatus) {
        if let Some(item) = self.items.iter_mut().find(|t| t.is_key(key)) {
            item.status = status;
        }
    }

    pub fn summary(&self) -> StatusSummary {
        let mut out = StatusSummary::default();
        for t in &self.items {
            match t.status {
                TaskStatus::NotStarted => out.not_started += 1,
                TaskStatus::InProgress => out.in_progress += 1,
                TaskStatus::Done => out.done += 1,
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../tests/engine/navigation_tests.rs"]
mod tests;
