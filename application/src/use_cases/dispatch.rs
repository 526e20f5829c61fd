//! Agent dispatcher
//!
//! Fans one task out to every selected agent, isolating failures so that
//! one broken agent never sinks the round.

use crate::config::DispatchParams;
use crate::ports::agent_invoker::{AgentInvoker, AgentOutput, InvokeError};
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::retry::{Attempted, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use verdict_domain::{
    AgentFailure, AgentIdentity, AgentResult, DomainError, EvaluationTask, FailureKind,
    ResponseNormalizer,
};

/// Results and failures of one dispatch
///
/// `results` follow the order of the agent list passed to
/// [`AgentDispatcher::dispatch`], not completion order.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub results: Vec<AgentResult>,
    pub failures: Vec<AgentFailure>,
}

/// Retry notice sent from an agent task to the collecting loop
struct RetryNotice {
    agent: AgentIdentity,
    retry: u32,
    error: String,
}

/// What a spawned agent task hands back
struct Finished {
    index: usize,
    agent: AgentIdentity,
    attempted: Attempted<AgentOutput>,
    elapsed: Duration,
}

/// Invokes a set of agents concurrently through the retry policy
pub struct AgentDispatcher<I: AgentInvoker + 'static> {
    invoker: Arc<I>,
    params: DispatchParams,
}

impl<I: AgentInvoker + 'static> AgentDispatcher<I> {
    pub fn new(invoker: Arc<I>, params: DispatchParams) -> Self {
        Self { invoker, params }
    }

    pub fn params(&self) -> &DispatchParams {
        &self.params
    }

    /// Invoke every agent and normalize what comes back
    ///
    /// Succeeds when at least one agent produced a usable result. Cancelling
    /// `cancel`, or hitting the task timeout, stops in-flight agents and
    /// keeps whatever had already finished.
    pub async fn dispatch(
        &self,
        task: &EvaluationTask,
        agents: &[AgentIdentity],
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<DispatchOutcome, DomainError> {
        if agents.is_empty() {
            return Err(DomainError::NoAgents);
        }

        info!(
            "Dispatching task {} ({}) to {} agents",
            task.id(),
            task.mode(),
            agents.len()
        );
        progress.on_dispatch_start(task, agents.len());

        let token = cancel.child_token();
        let timer = self.params.task_timeout.map(|limit| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                warn!("Task timed out after {:?}, cancelling agents", limit);
                token.cancel();
            })
        });

        let semaphore = Arc::new(Semaphore::new(self.params.concurrency_limit()));
        let policy = RetryPolicy::from_params(&self.params);
        let shared_task = Arc::new(task.clone());
        let (retry_tx, mut retry_rx) = mpsc::unbounded_channel::<RetryNotice>();

        let mut join_set = JoinSet::new();
        for (index, agent) in agents.iter().enumerate() {
            let invoker = Arc::clone(&self.invoker);
            let semaphore = Arc::clone(&semaphore);
            let task = Arc::clone(&shared_task);
            let token = token.clone();
            let retry_tx = retry_tx.clone();
            let agent = agent.clone();

            join_set.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };

                // Time queued behind the concurrency cap is not the agent's
                let started = Instant::now();
                let attempted = match permit {
                    Some(_permit) => {
                        policy
                            .run(
                                &token,
                                |retry, error, _| {
                                    let _ = retry_tx.send(RetryNotice {
                                        agent: agent.clone(),
                                        retry,
                                        error: error.to_string(),
                                    });
                                },
                                || invoker.invoke(&task, &agent),
                            )
                            .await
                    }
                    None => Attempted {
                        result: Err(InvokeError::Cancelled),
                        attempts: 0,
                    },
                };

                Finished {
                    index,
                    agent,
                    attempted,
                    elapsed: started.elapsed(),
                }
            });
        }
        drop(retry_tx);

        let normalizer = ResponseNormalizer::new(task.mode());
        let mut finished = vec![false; agents.len()];
        let mut results: Vec<(usize, AgentResult)> = Vec::new();
        let mut failures = Vec::new();

        loop {
            tokio::select! {
                biased;
                Some(notice) = retry_rx.recv() => {
                    progress.on_agent_retry(&notice.agent, notice.retry, &notice.error);
                }
                joined = join_set.join_next() => {
                    let Some(joined) = joined else { break };
                    let done = match joined {
                        Ok(done) => done,
                        Err(e) => {
                            warn!("Agent task join error: {}", e);
                            continue;
                        }
                    };
                    finished[done.index] = true;

                    match Self::settle(&normalizer, done.agent.clone(), done.attempted, done.elapsed) {
                        Ok(result) => {
                            info!("Agent {} produced a result", done.agent);
                            progress.on_agent_complete(&done.agent, true);
                            results.push((done.index, result));
                        }
                        Err(failure) => {
                            warn!(
                                "Agent {} failed ({}, {} attempts): {}",
                                failure.agent, failure.kind, failure.attempts, failure.message
                            );
                            progress.on_agent_complete(&done.agent, false);
                            failures.push(failure);
                        }
                    }
                }
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }

        // Agents whose task panicked never reported back
        for (index, agent) in agents.iter().enumerate() {
            if !finished[index] {
                progress.on_agent_complete(agent, false);
                failures.push(AgentFailure::new(
                    agent.clone(),
                    FailureKind::Invocation,
                    "agent task terminated unexpectedly",
                    0,
                ));
            }
        }

        progress.on_dispatch_complete(task);
        results.sort_by_key(|(index, _)| *index);
        let results: Vec<AgentResult> = results.into_iter().map(|(_, r)| r).collect();

        debug!(
            "Task {}: {} results, {} failures",
            task.id(),
            results.len(),
            failures.len()
        );

        if results.is_empty() {
            let cancelled = failures.iter().any(|f| f.kind == FailureKind::Cancelled);
            if cancelled && token.is_cancelled() {
                return Err(DomainError::Cancelled);
            }
            return Err(DomainError::AllAgentsFailed(failures));
        }

        Ok(DispatchOutcome { results, failures })
    }

    /// Turn one agent's final attempt into a result or a recorded failure
    fn settle(
        normalizer: &ResponseNormalizer,
        agent: AgentIdentity,
        attempted: Attempted<AgentOutput>,
        elapsed: Duration,
    ) -> Result<AgentResult, AgentFailure> {
        let attempts = attempted.attempts;
        match attempted.result {
            Ok(output) => match normalizer.normalize(&agent, &output.raw) {
                Ok(result) => Ok(result
                    .with_usage(output.usage)
                    .with_elapsed_ms(elapsed.as_millis() as u64)),
                Err(e) => Err(AgentFailure::new(
                    agent,
                    FailureKind::Malformed,
                    e.to_string(),
                    attempts,
                )),
            },
            Err(InvokeError::Cancelled) => Err(AgentFailure::new(
                agent,
                FailureKind::Cancelled,
                InvokeError::Cancelled.to_string(),
                attempts,
            )),
            Err(e) => {
                let kind = if e.is_transient() {
                    FailureKind::Transient
                } else {
                    FailureKind::Invocation
                };
                Err(AgentFailure::new(agent, kind, e.to_string(), attempts))
            }
        }
    }
}
