//! Per-work-item memo of which agents apply.

use crate::ports::selection::{SelectionError, SelectionStore, SelectionStrategy};
use crate::use_cases::evaluate::EvaluateError;
use std::sync::Arc;
use tracing::{debug, info, warn};
use verdict_domain::{AgentIdentity, DomainError, EvaluationTask};

/// Remembers agent selections so a work item is always judged by the
/// same agents
///
/// A stored selection always wins over the strategy, even when the
/// strategy would now choose differently.
pub struct SelectionCache {
    store: Arc<dyn SelectionStore>,
}

impl SelectionCache {
    pub fn new(store: Arc<dyn SelectionStore>) -> Self {
        Self { store }
    }

    /// Stored selection for `work_item_id`, or a fresh one from `strategy`
    ///
    /// An empty fresh selection is an error and nothing is stored. Failing
    /// to save a fresh selection is logged and the selection still returned.
    pub async fn get_or_compute(
        &self,
        work_item_id: &str,
        task: &EvaluationTask,
        strategy: &dyn SelectionStrategy,
    ) -> Result<Vec<AgentIdentity>, EvaluateError> {
        if let Some(stored) = self.store.load(work_item_id)? {
            debug!(
                "Using stored selection for {} ({} agents)",
                work_item_id,
                stored.len()
            );
            return Ok(stored);
        }

        let selected = strategy.select_for(task).await?;
        if selected.is_empty() {
            return Err(DomainError::AgentSelection(
                SelectionError::Empty(work_item_id.to_string()).to_string(),
            )
            .into());
        }

        info!(
            "Selected {} agents for {}: {}",
            selected.len(),
            work_item_id,
            selected
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if let Err(e) = self.store.save(work_item_id, &selected) {
            warn!("Failed to store selection for {}: {}", work_item_id, e);
        }
        Ok(selected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::selection::InMemorySelectionStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy that always returns the same agents
    pub(crate) struct FixedStrategy {
        agents: Vec<AgentIdentity>,
        calls: AtomicUsize,
    }

    impl FixedStrategy {
        pub(crate) fn new(agents: Vec<AgentIdentity>) -> Self {
            Self {
                agents,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SelectionStrategy for FixedStrategy {
        async fn select_for(
            &self,
            _task: &EvaluationTask,
        ) -> Result<Vec<AgentIdentity>, SelectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.agents.clone())
        }
    }

    fn task() -> EvaluationTask {
        EvaluationTask::review("story-7", "Story body").unwrap()
    }

    #[tokio::test]
    async fn test_stored_selection_wins() {
        let store = Arc::new(InMemorySelectionStore::new());
        store
            .save(
                "story-7",
                &[
                    AgentIdentity::universal("validator-general"),
                    AgentIdentity::domain("validator-api"),
                ],
            )
            .unwrap();
        let cache = SelectionCache::new(store.clone());
        let strategy = FixedStrategy::new(vec![AgentIdentity::domain("validator-database")]);

        let agents = cache
            .get_or_compute("story-7", &task(), &strategy)
            .await
            .unwrap();

        assert_eq!(
            agents,
            vec![
                AgentIdentity::universal("validator-general"),
                AgentIdentity::domain("validator-api"),
            ]
        );
        assert_eq!(strategy.calls(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fresh_selection_is_stored() {
        let store = Arc::new(InMemorySelectionStore::new());
        let cache = SelectionCache::new(store.clone());
        let strategy = FixedStrategy::new(vec![AgentIdentity::domain("validator-security")]);

        let first = cache.get_or_compute("story-7", &task(), &strategy).await.unwrap();
        let second = cache.get_or_compute("story-7", &task(), &strategy).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(strategy.calls(), 1);
        assert_eq!(
            store.load("story-7").unwrap(),
            Some(vec![AgentIdentity::domain("validator-security")])
        );
    }

    #[tokio::test]
    async fn test_empty_selection_is_an_error() {
        let store = Arc::new(InMemorySelectionStore::new());
        let cache = SelectionCache::new(store.clone());
        let strategy = FixedStrategy::new(vec![]);

        let err = cache
            .get_or_compute("story-7", &task(), &strategy)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EvaluateError::Domain(DomainError::AgentSelection(_))
        ));
        assert!(store.is_empty());
    }
}
