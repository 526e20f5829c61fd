//! Subprocess agent invoker.
//!
//! Each agent is an external command. The task prompt goes to stdin and
//! stdout is the agent's raw output. A JSON object on stdout is passed on
//! as structured output; anything else is free text.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use verdict_application::{AgentInvoker, AgentOutput, InvokeError};
use verdict_domain::{AgentIdentity, EvaluationTask, RawOutput, TokenUsage};

/// Longest stderr excerpt carried in an error message
const STDERR_EXCERPT_CHARS: usize = 500;

/// [`AgentInvoker`] that runs a shell command per agent
///
/// Command templates may use `{agent}`, `{task}` and `{mode}`. The same
/// values are exported as `VERDICT_AGENT`, `VERDICT_TASK_ID` and
/// `VERDICT_MODE`. A dropped invocation (cancellation, timeout) kills the
/// child process.
pub struct CommandInvoker {
    default_template: String,
    overrides: BTreeMap<String, String>,
    shell: String,
}

impl CommandInvoker {
    pub fn new(default_template: impl Into<String>) -> Self {
        Self {
            default_template: default_template.into(),
            overrides: BTreeMap::new(),
            shell: "sh".to_string(),
        }
    }

    /// Per-agent templates, keyed by agent name
    pub fn with_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// The command line that would run for an agent and task
    pub fn command_line(&self, task: &EvaluationTask, agent: &AgentIdentity) -> String {
        let template = self
            .overrides
            .get(&agent.name)
            .unwrap_or(&self.default_template);
        template
            .replace("{agent}", &agent.name)
            .replace("{task}", task.id())
            .replace("{mode}", task.mode().as_str())
    }
}

#[async_trait]
impl AgentInvoker for CommandInvoker {
    async fn invoke(
        &self,
        task: &EvaluationTask,
        agent: &AgentIdentity,
    ) -> Result<AgentOutput, InvokeError> {
        let command_line = self.command_line(task, agent);
        debug!("Invoking {}: {}", agent, command_line);

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(&command_line)
            .env("VERDICT_AGENT", &agent.name)
            .env("VERDICT_TASK_ID", task.id())
            .env("VERDICT_MODE", task.mode().as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InvokeError::Other(format!("failed to start '{}': {}", command_line, e)))?;

        // Feed stdin while draining stdout so large prompts cannot deadlock
        let stdin = child.stdin.take();
        let prompt = task.prompt();
        let write_prompt = async move {
            if let Some(mut stdin) = stdin
                && let Err(e) = stdin.write_all(prompt.as_bytes()).await
            {
                // A command that ignores stdin may close it early
                debug!("{} closed stdin early: {}", agent, e);
            }
        };
        let (_, output) = tokio::join!(write_prompt, child.wait_with_output());
        let output = output.map_err(|e| InvokeError::ConnectionError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect();
            return Err(InvokeError::RequestFailed(format!(
                "{} exited with {}: {}",
                agent, output.status, excerpt
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(parse_stdout(stdout))
    }
}

/// Structured output when stdout is one JSON object, else free text
///
/// A top-level `usage` object (`input_tokens` / `output_tokens`) is lifted
/// into the token usage.
fn parse_stdout(stdout: String) -> AgentOutput {
    let trimmed = stdout.trim();
    if trimmed.starts_with('{')
        && let Ok(Value::Object(mut map)) = serde_json::from_str::<Value>(trimmed)
    {
        let usage = map.remove("usage").map(|u| parse_usage(&u)).unwrap_or_default();
        return AgentOutput::new(RawOutput::Structured(Value::Object(map))).with_usage(usage);
    }
    AgentOutput::new(RawOutput::Text(stdout))
}

fn parse_usage(value: &Value) -> TokenUsage {
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| value.get(*n).and_then(Value::as_u64))
            .unwrap_or(0)
    };
    TokenUsage::new(
        field(&["input_tokens", "input", "prompt_tokens"]),
        field(&["output_tokens", "output", "completion_tokens"]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> EvaluationTask {
        EvaluationTask::review("story-1", "As a user I want to reset my password")
            .unwrap()
            .with_instructions("Review this story.")
    }

    #[test]
    fn test_command_line_substitution() {
        let mut overrides = BTreeMap::new();
        overrides.insert("gpt-4o".to_string(), "openai --model {agent}".to_string());
        let invoker = CommandInvoker::new("llm -m {agent} --task {task} --mode {mode}")
            .with_overrides(overrides);

        assert_eq!(
            invoker.command_line(&task(), &AgentIdentity::provider("claude-sonnet")),
            "llm -m claude-sonnet --task story-1 --mode review"
        );
        assert_eq!(
            invoker.command_line(&task(), &AgentIdentity::provider("gpt-4o")),
            "openai --model gpt-4o"
        );
    }

    #[test]
    fn test_parse_stdout_json_with_usage() {
        let output = parse_stdout(
            r#"{"status": "excellent", "score": 91, "usage": {"input_tokens": 1200, "output_tokens": 300}}"#
                .to_string(),
        );
        assert_eq!(output.usage, TokenUsage::new(1200, 300));
        match output.raw {
            RawOutput::Structured(Value::Object(map)) => {
                assert!(map.contains_key("status"));
                assert!(!map.contains_key("usage"));
            }
            other => panic!("expected structured output, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_stdout_text() {
        let output = parse_stdout("STATUS: acceptable\n{not json".to_string());
        assert!(matches!(output.raw, RawOutput::Text(_)));
        assert_eq!(output.usage, TokenUsage::default());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_passes_prompt_on_stdin() {
        let invoker = CommandInvoker::new("cat");
        let output = invoker
            .invoke(&task(), &AgentIdentity::universal("validator-general"))
            .await
            .unwrap();

        match output.raw {
            RawOutput::Text(text) => {
                assert!(text.starts_with("Review this story."));
                assert!(text.contains("reset my password"));
            }
            other => panic!("expected text output, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_exports_environment() {
        let invoker = CommandInvoker::new("echo \"$VERDICT_AGENT/$VERDICT_MODE\"");
        let output = invoker
            .invoke(&task(), &AgentIdentity::domain("validator-api"))
            .await
            .unwrap();
        assert_eq!(output.raw, RawOutput::Text("validator-api/review\n".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_command_carries_stderr() {
        let invoker = CommandInvoker::new("echo 'rate limit exceeded' >&2; exit 3");
        let err = invoker
            .invoke(&task(), &AgentIdentity::provider("claude-haiku"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rate limit exceeded"));
        assert!(err.is_transient());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permanent_command_failure() {
        let invoker = CommandInvoker::new("echo 'unknown model' >&2; exit 1");
        let err = invoker
            .invoke(&task(), &AgentIdentity::provider("claude-haiku"))
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }
}
