//! JSONL file writer for evaluation events.
//!
//! Each [`EvaluationEvent`] is serialized as a single JSON line with `type`,
//! `task_id` and `timestamp` fields, appended to the file via a buffered
//! writer. Earlier runs' lines are kept.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use verdict_application::{EvaluationEvent, EvaluationLogger};

/// JSONL evaluation logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEvaluationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEvaluationLogger {
    /// Create a logger appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create evaluation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open evaluation log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EvaluationLogger for JsonlEvaluationLogger {
    fn log(&self, event: EvaluationEvent) {
        let timestamp = event
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // Merge payload with type + task id + timestamp
        let record = if let serde_json::Value::Object(mut map) = event.payload {
            map.insert(
                "type".to_string(),
                serde_json::Value::String(event.event_type.to_string()),
            );
            map.insert(
                "task_id".to_string(),
                serde_json::Value::String(event.task_id),
            );
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
            serde_json::Value::Object(map)
        } else {
            serde_json::json!({
                "type": event.event_type,
                "task_id": event.task_id,
                "timestamp": timestamp,
                "data": event.payload,
            })
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each record so a crash loses nothing
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEvaluationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_logger_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evaluations.jsonl");
        let logger = JsonlEvaluationLogger::new(&path).unwrap();

        logger.log(EvaluationEvent::new(
            "agent_result",
            "story-1",
            serde_json::json!({
                "agent": {"name": "validator-api", "category": "domain"},
                "score": 85
            }),
        ));
        logger.log(EvaluationEvent::new(
            "review_report",
            "story-1",
            serde_json::json!({ "overall_status": "acceptable" }),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(line.get("timestamp").is_some());
            assert_eq!(line["task_id"], "story-1");
        }
        assert_eq!(lines[0]["type"], "agent_result");
        assert_eq!(lines[0]["score"], 85);
        assert_eq!(lines[1]["type"], "review_report");
    }

    #[test]
    fn test_jsonl_logger_handles_non_object_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let logger = JsonlEvaluationLogger::new(&path).unwrap();

        logger.log(EvaluationEvent::new(
            "note",
            "t-1",
            serde_json::json!("just a string"),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "note");
        assert_eq!(lines[0]["data"], "just a string");
    }

    #[test]
    fn test_jsonl_logger_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("evaluations.jsonl");

        for run in 0..2 {
            let logger = JsonlEvaluationLogger::new(&path).unwrap();
            logger.log(EvaluationEvent::new(
                "task_failed",
                format!("t-{}", run),
                serde_json::json!({ "error": "All 2 agents failed to produce a usable result" }),
            ));
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["task_id"], "t-1");
    }
}
