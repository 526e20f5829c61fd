//! Agent selection ports
//!
//! [`SelectionStrategy`] decides which agents apply to a work item;
//! [`SelectionStore`] persists that decision so later runs reuse it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use verdict_domain::{AgentIdentity, EvaluationTask};

/// Errors raised while choosing agents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No agents selected for work item '{0}'")]
    Empty(String),

    #[error("Selection strategy failed: {0}")]
    Strategy(String),
}

/// Errors raised by a selection store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Selection store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Selection store is corrupt: {0}")]
    Corrupt(String),
}

/// Chooses the agents that should evaluate a work item
#[async_trait]
pub trait SelectionStrategy: Send + Sync {
    async fn select_for(&self, task: &EvaluationTask)
    -> Result<Vec<AgentIdentity>, SelectionError>;
}

/// Keyed persistence for agent selections
///
/// Entries are overwritten as a whole, never merged.
pub trait SelectionStore: Send + Sync {
    fn load(&self, work_item_id: &str) -> Result<Option<Vec<AgentIdentity>>, StoreError>;

    fn save(&self, work_item_id: &str, agents: &[AgentIdentity]) -> Result<(), StoreError>;
}

/// Process-local store, for tests and one-shot runs
#[derive(Debug, Default)]
pub struct InMemorySelectionStore {
    entries: Mutex<HashMap<String, Vec<AgentIdentity>>>,
}

impl InMemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SelectionStore for InMemorySelectionStore {
    fn load(&self, work_item_id: &str) -> Result<Option<Vec<AgentIdentity>>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(entries.get(work_item_id).cloned())
    }

    fn save(&self, work_item_id: &str, agents: &[AgentIdentity]) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        entries.insert(work_item_id.to_string(), agents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store_overwrites() {
        let store = InMemorySelectionStore::new();
        assert!(store.load("story-1").unwrap().is_none());

        store
            .save("story-1", &[AgentIdentity::universal("validator-general")])
            .unwrap();
        store
            .save("story-1", &[AgentIdentity::domain("validator-api")])
            .unwrap();

        let loaded = store.load("story-1").unwrap().unwrap();
        assert_eq!(loaded, vec![AgentIdentity::domain("validator-api")]);
        assert_eq!(store.len(), 1);
    }
}
