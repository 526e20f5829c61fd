//! Progress reporting for agent dispatch

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use verdict_application::ProgressNotifier;
use verdict_domain::{AgentIdentity, EvaluationTask};

/// Reports progress during dispatch with progress bars
///
/// A batch gets an outer bar counting tasks; every dispatch gets an inner
/// bar counting agents.
pub struct ProgressReporter {
    multi: MultiProgress,
    dispatch_bar: Mutex<Option<ProgressBar>>,
    batch_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            dispatch_bar: Mutex::new(None),
            batch_bar: Mutex::new(None),
        }
    }

    fn dispatch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-")
    }

    fn batch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.yellow/dim}] {pos}/{len} tasks {elapsed}")
            .unwrap()
            .progress_chars("●○-")
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_dispatch_start(&self, task: &EvaluationTask, total_agents: usize) {
        let pb = self.multi.add(ProgressBar::new(total_agents as u64));
        pb.set_style(Self::dispatch_style());
        pb.set_prefix(format!("{} {}", task.mode(), task.id()));
        pb.set_message("Starting...");

        *self.dispatch_bar.lock().unwrap() = Some(pb);
    }

    fn on_agent_complete(&self, agent: &AgentIdentity, success: bool) {
        if let Some(pb) = self.dispatch_bar.lock().unwrap().as_ref() {
            let status = if success {
                format!("{} {}", "v".green(), agent)
            } else {
                format!("{} {}", "x".red(), agent)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_agent_retry(&self, agent: &AgentIdentity, attempt: u32, error: &str) {
        if let Some(pb) = self.dispatch_bar.lock().unwrap().as_ref() {
            pb.set_message(format!(
                "{} {} retry {} ({})",
                "~".yellow(),
                agent,
                attempt,
                error
            ));
        }
    }

    fn on_dispatch_complete(&self, task: &EvaluationTask) {
        if let Some(pb) = self.dispatch_bar.lock().unwrap().take() {
            if self.batch_bar.lock().unwrap().is_some() {
                // Keep the batch view compact
                pb.finish_and_clear();
            } else {
                pb.finish_with_message(format!("{} complete!", task.id().green()));
            }
        }
    }

    fn on_batch_progress(&self, completed: usize, total: usize) {
        let mut guard = self.batch_bar.lock().unwrap();
        let pb = guard.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::batch_style());
            pb.set_prefix("Batch");
            pb
        });
        pb.set_position(completed as u64);
        if completed >= total {
            pb.finish();
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_dispatch_start(&self, task: &EvaluationTask, total_agents: usize) {
        eprintln!(
            "{} {} {} ({} agents)",
            "->".cyan(),
            task.mode(),
            task.id().bold(),
            total_agents
        );
    }

    fn on_agent_complete(&self, agent: &AgentIdentity, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), agent);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), agent);
        }
    }

    fn on_agent_retry(&self, agent: &AgentIdentity, attempt: u32, error: &str) {
        eprintln!("  {} {} retry {}: {}", "~".yellow(), agent, attempt, error);
    }

    fn on_dispatch_complete(&self, _task: &EvaluationTask) {
        eprintln!();
    }

    fn on_batch_progress(&self, completed: usize, total: usize) {
        eprintln!("{} {}/{} tasks", "==".cyan(), completed, total);
    }
}
