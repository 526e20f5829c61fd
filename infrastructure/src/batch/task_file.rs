//! Reader for batch task files.
//!
//! A batch file is either a JSON array of task objects or JSON Lines with
//! one task object per line. Each object carries the task fields plus an
//! optional `agents` list:
//!
//! ```json
//! {"id": "story-1", "mode": "review", "subject": "...", "work_item_id": "story-1"}
//! {"id": "q-1", "mode": "recommendation", "subject": "...", "agents": ["claude-haiku"], "baseline": "haiku"}
//! ```
//!
//! Bare agent names take the `domain` category in review tasks and the
//! `provider` category in recommendation tasks; `category:name` overrides.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use verdict_application::BatchEntry;
use verdict_domain::{AgentCategory, AgentIdentity, EvaluationMode, EvaluationTask};

#[derive(Error, Debug)]
pub enum BatchFileError {
    #[error("Failed to read batch file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid task at line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Invalid task at line {line}: {message}")]
    Invalid { line: usize, message: String },

    #[error("Batch file contains no tasks")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct TaskRecord {
    #[serde(flatten)]
    task: EvaluationTask,
    #[serde(default)]
    agents: Vec<String>,
}

impl TaskRecord {
    fn into_entry(self, line: usize) -> Result<BatchEntry, BatchFileError> {
        self.task
            .validate()
            .map_err(|e| BatchFileError::Invalid {
                line,
                message: e.to_string(),
            })?;

        let default_category = match self.task.mode() {
            EvaluationMode::Review => AgentCategory::Domain,
            EvaluationMode::Recommendation => AgentCategory::Provider,
        };
        let agents = self
            .agents
            .iter()
            .map(|spec| AgentIdentity::parse(spec, default_category))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|message| BatchFileError::Invalid { line, message })?;

        Ok(BatchEntry::new(self.task).with_agents(agents))
    }
}

/// Read and parse a batch file
pub fn load_batch_file(path: &Path) -> Result<Vec<BatchEntry>, BatchFileError> {
    let content = std::fs::read_to_string(path)?;
    parse_batch(&content)
}

/// Parse batch content as a JSON array or as JSON Lines
///
/// Line numbers in errors are 1-based file lines for JSON Lines and
/// 1-based array positions for an array.
pub fn parse_batch(content: &str) -> Result<Vec<BatchEntry>, BatchFileError> {
    let trimmed = content.trim_start();

    let entries = if trimmed.starts_with('[') {
        let records: Vec<serde_json::Value> = serde_json::from_str(trimmed)
            .map_err(|source| BatchFileError::Parse { line: 1, source })?;
        records
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let record: TaskRecord = serde_json::from_value(value)
                    .map_err(|source| BatchFileError::Parse { line: i + 1, source })?;
                record.into_entry(i + 1)
            })
            .collect::<Result<Vec<_>, _>>()?
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("//")
            })
            .map(|(i, line)| {
                let record: TaskRecord = serde_json::from_str(line)
                    .map_err(|source| BatchFileError::Parse { line: i + 1, source })?;
                record.into_entry(i + 1)
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    if entries.is_empty() {
        return Err(BatchFileError::Empty);
    }
    Ok(entries)
}
