//! Evaluate use case
//!
//! Runs one evaluation round (dispatch, normalize, reduce) for a single
//! task, or a batch of tasks one after another.

use crate::config::DispatchParams;
use crate::ports::agent_invoker::AgentInvoker;
use crate::ports::evaluation_logger::{EvaluationEvent, EvaluationLogger, NoEvaluationLogger};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::selection::{SelectionError, SelectionStrategy, StoreError};
use crate::use_cases::dispatch::{AgentDispatcher, DispatchOutcome};
use crate::use_cases::selection_cache::SelectionCache;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use verdict_domain::{
    AgentFailure, AgentIdentity, AgentResult, AggregatedReport, BaselineDelta, BatchSummary,
    ConsensusAnalyzer, ConsensusRecord, CostAccountant, CostSummary, DomainError,
    EvaluationMode, EvaluationTask, PriceTable, TaskOutcome, TaskReport, TierVocabulary,
    aggregate,
};

/// Errors that end one task's evaluation
#[derive(Error, Debug)]
pub enum EvaluateError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EvaluateError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EvaluateError::Domain(e) if e.is_cancelled())
    }

    /// Per-agent failures that led to this error, if any
    pub fn failures(&self) -> &[AgentFailure] {
        match self {
            EvaluateError::Domain(e) => e.failures(),
            _ => &[],
        }
    }
}

/// Result of a review round
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub task_id: String,
    pub report: AggregatedReport,
    /// Per-agent results the report was computed from
    pub results: Vec<AgentResult>,
    pub failures: Vec<AgentFailure>,
    pub elapsed_ms: u64,
}

/// Result of a recommendation round
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationOutcome {
    pub task_id: String,
    pub record: ConsensusRecord,
    pub results: Vec<AgentResult>,
    pub failures: Vec<AgentFailure>,
    /// Majority tier compared with the task's baseline, when both are known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineDelta>,
    pub elapsed_ms: u64,
}

/// One task in a batch
///
/// With no agents the task's agents come from the selection cache.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub task: EvaluationTask,
    pub agents: Vec<AgentIdentity>,
}

impl BatchEntry {
    pub fn new(task: EvaluationTask) -> Self {
        Self {
            task,
            agents: Vec::new(),
        }
    }

    pub fn with_agents(mut self, agents: Vec<AgentIdentity>) -> Self {
        self.agents = agents;
        self
    }
}

/// Selection source used when a batch entry names no agents
struct Selection {
    cache: SelectionCache,
    strategy: Arc<dyn SelectionStrategy>,
}

/// Use case for evaluating tasks with several agents
pub struct EvaluateUseCase<I: AgentInvoker + 'static> {
    dispatcher: AgentDispatcher<I>,
    analyzer: ConsensusAnalyzer,
    prices: PriceTable,
    accountant: Mutex<CostAccountant>,
    logger: Arc<dyn EvaluationLogger>,
    selection: Option<Selection>,
    cancel: CancellationToken,
}

impl<I: AgentInvoker + 'static> EvaluateUseCase<I> {
    pub fn new(invoker: Arc<I>, params: DispatchParams) -> Self {
        let prices = PriceTable::default();
        Self {
            dispatcher: AgentDispatcher::new(invoker, params),
            analyzer: ConsensusAnalyzer::default(),
            accountant: Mutex::new(CostAccountant::new(prices.clone())),
            prices,
            logger: Arc::new(NoEvaluationLogger),
            selection: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: TierVocabulary) -> Self {
        self.analyzer = ConsensusAnalyzer::new(vocabulary);
        self
    }

    /// Replace the price table; running totals start over
    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.accountant = Mutex::new(CostAccountant::new(prices.clone()));
        self.prices = prices;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn EvaluationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_selection(
        mut self,
        cache: SelectionCache,
        strategy: Arc<dyn SelectionStrategy>,
    ) -> Self {
        self.selection = Some(Selection { cache, strategy });
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Running cost totals over every task evaluated so far
    pub fn cost_summary(&self) -> CostSummary {
        self.accountant
            .lock()
            .map(|accountant| accountant.summary())
            .unwrap_or_default()
    }

    /// Agents for a task, from the selection cache keyed by its work item
    pub async fn select_agents(
        &self,
        task: &EvaluationTask,
    ) -> Result<Vec<AgentIdentity>, EvaluateError> {
        let Some(selection) = &self.selection else {
            return Err(DomainError::NoAgents.into());
        };
        let work_item_id = task.work_item_id().unwrap_or(task.id());
        selection
            .cache
            .get_or_compute(work_item_id, task, selection.strategy.as_ref())
            .await
    }

    // ==================== Review ====================

    pub async fn evaluate_review(
        &self,
        task: &EvaluationTask,
        agents: &[AgentIdentity],
    ) -> Result<ReviewOutcome, EvaluateError> {
        self.evaluate_review_with_progress(task, agents, &NoProgress)
            .await
    }

    /// Dispatch a review task and aggregate the results
    pub async fn evaluate_review_with_progress(
        &self,
        task: &EvaluationTask,
        agents: &[AgentIdentity],
        progress: &dyn ProgressNotifier,
    ) -> Result<ReviewOutcome, EvaluateError> {
        let started = Instant::now();
        Self::require_mode(task, EvaluationMode::Review)?;

        let DispatchOutcome { results, failures } = self.dispatch(task, agents, progress).await?;
        let report = aggregate(&results);

        info!(
            "Review {}: {} from {} validators (average score {})",
            task.id(),
            report.overall_status,
            report.validator_count,
            report
                .average_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
        self.log(task, "review_report", serde_json::to_value(&report));

        let elapsed_ms = self.finish(started);
        Ok(ReviewOutcome {
            task_id: task.id().to_string(),
            report,
            results,
            failures,
            elapsed_ms,
        })
    }

    // ==================== Recommendation ====================

    pub async fn evaluate_recommendation(
        &self,
        task: &EvaluationTask,
        agents: &[AgentIdentity],
    ) -> Result<RecommendationOutcome, EvaluateError> {
        self.evaluate_recommendation_with_progress(task, agents, &NoProgress)
            .await
    }

    /// Dispatch a recommendation task and measure agreement
    pub async fn evaluate_recommendation_with_progress(
        &self,
        task: &EvaluationTask,
        agents: &[AgentIdentity],
        progress: &dyn ProgressNotifier,
    ) -> Result<RecommendationOutcome, EvaluateError> {
        let started = Instant::now();
        Self::require_mode(task, EvaluationMode::Recommendation)?;

        let DispatchOutcome { results, failures } = self.dispatch(task, agents, progress).await?;
        let record = self.analyzer.analyze(&results);
        let baseline = match (task.baseline(), record.majority.as_ref()) {
            (Some(baseline), Some(majority)) => {
                BaselineDelta::compare(self.analyzer.vocabulary(), baseline, majority)
            }
            _ => None,
        };

        info!(
            "Recommendation {}: {} agreement on {} ({})",
            task.id(),
            record.level.as_str(),
            record.majority_name().unwrap_or("nothing"),
            record.agreement()
        );
        self.log(task, "consensus_record", serde_json::to_value(&record));

        let elapsed_ms = self.finish(started);
        Ok(RecommendationOutcome {
            task_id: task.id().to_string(),
            record,
            results,
            failures,
            baseline,
            elapsed_ms,
        })
    }

    // ==================== Batch ====================

    pub async fn evaluate_batch(&self, entries: Vec<BatchEntry>) -> BatchSummary {
        self.evaluate_batch_with_progress(entries, &NoProgress)
            .await
    }

    /// Evaluate tasks one at a time
    ///
    /// A failed task is recorded and the batch moves on. Once cancelled,
    /// the remaining tasks are recorded as failed without being dispatched.
    pub async fn evaluate_batch_with_progress(
        &self,
        entries: Vec<BatchEntry>,
        progress: &dyn ProgressNotifier,
    ) -> BatchSummary {
        let total = entries.len();
        info!("Starting batch of {} tasks", total);

        let mut batch_costs = CostAccountant::new(self.prices.clone());
        let mut reports = Vec::with_capacity(total);

        for (completed, entry) in entries.into_iter().enumerate() {
            progress.on_batch_progress(completed, total);
            let started = Instant::now();

            let outcome = if self.cancel.is_cancelled() {
                TaskOutcome::Failed {
                    error: DomainError::Cancelled.to_string(),
                    failures: Vec::new(),
                }
            } else {
                self.evaluate_entry(&entry, progress, &mut batch_costs)
                    .await
            };

            if let TaskOutcome::Failed { error, .. } = &outcome {
                warn!("Task {} failed: {}", entry.task.id(), error);
                self.log(
                    &entry.task,
                    "task_failed",
                    Ok(json!({ "error": error, "failures": outcome.failures().len() })),
                );
            }

            let elapsed_ms = started.elapsed().as_millis() as u64;
            batch_costs.record_wall_time(elapsed_ms);
            reports.push(TaskReport {
                task_id: entry.task.id().to_string(),
                mode: entry.task.mode(),
                elapsed_ms,
                outcome,
            });
        }
        progress.on_batch_progress(total, total);

        let summary = BatchSummary::new(reports, batch_costs.summary());
        info!(
            "Batch finished: {} succeeded, {} failed, ${:.4} total",
            summary.succeeded_tasks(),
            summary.failed_tasks,
            summary.cost.total.cost_usd
        );
        summary
    }

    async fn evaluate_entry(
        &self,
        entry: &BatchEntry,
        progress: &dyn ProgressNotifier,
        batch_costs: &mut CostAccountant,
    ) -> TaskOutcome {
        let task = &entry.task;
        let agents = if entry.agents.is_empty() {
            match self.select_agents(task).await {
                Ok(agents) => agents,
                Err(e) => return Self::failed(e),
            }
        } else {
            entry.agents.clone()
        };

        match task.mode() {
            EvaluationMode::Review => {
                match self
                    .evaluate_review_with_progress(task, &agents, progress)
                    .await
                {
                    Ok(outcome) => {
                        outcome.results.iter().for_each(|r| batch_costs.record(r));
                        TaskOutcome::Review {
                            report: outcome.report,
                            failures: outcome.failures,
                        }
                    }
                    Err(e) => Self::failed(e),
                }
            }
            EvaluationMode::Recommendation => {
                match self
                    .evaluate_recommendation_with_progress(task, &agents, progress)
                    .await
                {
                    Ok(outcome) => {
                        outcome.results.iter().for_each(|r| batch_costs.record(r));
                        TaskOutcome::Recommendation {
                            record: outcome.record,
                            failures: outcome.failures,
                            baseline: outcome.baseline,
                        }
                    }
                    Err(e) => Self::failed(e),
                }
            }
        }
    }

    // ==================== Helpers ====================

    fn failed(error: EvaluateError) -> TaskOutcome {
        TaskOutcome::Failed {
            error: error.to_string(),
            failures: error.failures().to_vec(),
        }
    }

    fn require_mode(task: &EvaluationTask, mode: EvaluationMode) -> Result<(), DomainError> {
        task.validate()?;
        if task.mode() != mode {
            return Err(DomainError::InvalidTask(format!(
                "task {} is a {} task, not {}",
                task.id(),
                task.mode(),
                mode
            )));
        }
        Ok(())
    }

    /// Dispatch, then record costs and per-agent events
    async fn dispatch(
        &self,
        task: &EvaluationTask,
        agents: &[AgentIdentity],
        progress: &dyn ProgressNotifier,
    ) -> Result<DispatchOutcome, EvaluateError> {
        let outcome = match self
            .dispatcher
            .dispatch(task, agents, &self.cancel, progress)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.log_failures(task, e.failures());
                return Err(e.into());
            }
        };

        if let Ok(mut accountant) = self.accountant.lock() {
            outcome.results.iter().for_each(|r| accountant.record(r));
        }
        for result in &outcome.results {
            self.log(task, "agent_result", serde_json::to_value(result));
        }
        self.log_failures(task, &outcome.failures);

        Ok(outcome)
    }

    fn finish(&self, started: Instant) -> u64 {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if let Ok(mut accountant) = self.accountant.lock() {
            accountant.record_wall_time(elapsed_ms);
        }
        elapsed_ms
    }

    fn log_failures(&self, task: &EvaluationTask, failures: &[AgentFailure]) {
        for failure in failures {
            self.log(task, "agent_failure", serde_json::to_value(failure));
        }
    }

    fn log(
        &self,
        task: &EvaluationTask,
        event_type: &'static str,
        payload: Result<serde_json::Value, serde_json::Error>,
    ) {
        match payload {
            Ok(payload) => self
                .logger
                .log(EvaluationEvent::new(event_type, task.id(), payload)),
            Err(e) => warn!("Failed to serialize {} event: {}", event_type, e),
        }
    }
}
