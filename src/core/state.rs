use serde::{Deserialize, Serialize};

/// Progress of scene writing, persisted as `state.json`.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct WorkflowState {
    pub completed_scenes: Vec<String>,
}

impl WorkflowState {
    pub fn is_done(&self, key: &str) -> bool {
        self.completed_scenes.iter().any(|k| k == key)
    }

    pub fn mark_done(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !self.is_done(&key) {
            self.completed_scenes.push(key);
        }
    }
}
