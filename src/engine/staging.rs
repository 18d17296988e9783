//! Two-phase apply for externally proposed grids.
//!
//! `Idle -> Requesting -> Staged -> Idle`. A request is identified by a
//! [`SuggestionTicket`]; a response whose ticket is no longer current (a newer
//! request was issued, or a different task was opened) is dropped.

use crate::model::TaskKey;

use super::error::EngineError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionTicket {
    pub generation: u64,
    pub task: TaskKey,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StageState {
    #[default]
    Idle,
    Requesting(SuggestionTicket),
    Staged {
        ticket: SuggestionTicket,
        rows: Vec<Vec<String>>,
    },
}

/// What happened to a provider response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageEvent {
    Staged,
    /// The response belonged to a superseded request and was ignored.
    Stale,
}

#[derive(Debug, Default)]
pub struct SuggestionStage {
    state: StageState,
    generation: u64,
}

impl SuggestionStage {
    pub fn state(&self) -> &StageState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, StageState::Idle)
    }

    pub fn staged_rows(&self) -> Option<&[Vec<String>]> {
        match &self.state {
            StageState::Staged { rows, .. } => Some(rows),
            _ => None,
        }
    }

    /// Starts a request, discarding anything staged or in flight.
    pub fn begin(&mut self, task: &TaskKey) -> SuggestionTicket {
        self.generation += 1;
        let ticket = SuggestionTicket {
            generation: self.generation,
            task: task.clone(),
        };
        self.state = StageState::Requesting(ticket.clone());
        ticket
    }

    /// Records the provider's answer for `ticket`. `open_task` is the task
    /// currently being edited.
    pub fn complete(
        &mut self,
        ticket: &SuggestionTicket,
        open_task: Option<&TaskKey>,
        result: anyhow::Result<Vec<Vec<String>>>,
    ) -> Result<StageEvent, EngineError> {
        let current = matches!(&self.state, StageState::Requesting(t) if t == ticket)
            && open_task == Some(&ticket.task);
        if !current {
            tracing::warn!(
                generation = ticket.generation,
                task = %ticket.task,
                "discarding stale suggestion response"
            );
            return Ok(StageEvent::Stale);
        }
        match result {
            Ok(rows) => {
                self.state = StageState::Staged {
                    ticket: ticket.clone(),
                    rows,
                };
                Ok(StageEvent::Staged)
            }
            Err(err) => {
                self.state = StageState::Idle;
                Err(EngineError::Suggestion(err))
            }
        }
    }

    /// Staged -> Idle, handing the rows to the caller for applying.
    pub fn take_for_accept(&mut self) -> Result<Vec<Vec<String>>, EngineError> {
        match std::mem::take(&mut self.state) {
            StageState::Staged { rows, .. } => Ok(rows),
            other => {
                self.state = other;
                Err(EngineError::NothingStaged)
            }
        }
    }

    pub fn reject(&mut self) -> Result<(), EngineError> {
        match self.state {
            StageState::Staged { .. } => {
                self.state = StageState::Idle;
                Ok(())
            }
            _ => Err(EngineError::NothingStaged),
        }
    }

    /// Forgets everything; any response still in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = StageState::Idle;
    }
}

#[cfg(test)]
#[path = "../tests/engine/staging_tests.rs"]
mod tests;
