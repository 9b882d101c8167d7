//! Last-known worker states.
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Mutex};

/// Lifecycle state of a worker thread.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum WorkerState {
    /// Built but not yet running.
    NotStarted,

    /// Executing its training loop.
    Running,

    /// Finished normally, including listener-requested stops.
    Stopped,

    /// Terminated by an error.
    Failed,
}

/// An id-keyed store of the last known state of each worker.
///
/// One entry per worker, overwritten on each update; no history is kept.
#[derive(Debug, Default)]
pub struct WorkerStateStore {
    states: Mutex<HashMap<usize, WorkerState>>,
}

impl WorkerStateStore {
    /// Constructs an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the last known state of the given worker.
    pub fn update_state(&self, id: usize, state: WorkerState) {
        self.states.lock().unwrap().insert(id, state);
    }

    /// Returns the last known state of the given worker, if any.
    pub fn get_state(&self, id: usize) -> Option<WorkerState> {
        self.states.lock().unwrap().get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_overwrite_previous_states() {
        let store = WorkerStateStore::new();
        assert_eq!(store.get_state(0), None);

        store.update_state(0, WorkerState::NotStarted);
        store.update_state(0, WorkerState::Running);
        assert_eq!(store.get_state(0), Some(WorkerState::Running));
        assert_eq!(store.get_state(1), None);
    }
}
