//! Response normalization: raw agent output → [`AgentResult`].
//!
//! Two input shapes are supported:
//!
//! 1. **Structured**: a JSON object carrying the canonical fields, either as
//!    the whole output or embedded in prose/markdown fences. Passed through
//!    with light type validation.
//! 2. **Free text**: canonical fields are pulled out with the
//!    [`extraction`](super::extraction) grammar.
//!
//! # Fallback order (free text)
//!
//! | Field | Source | Fallback |
//! |-------|--------|----------|
//! | recommended entity | `RECOMMENDED MODEL:` first line | first non-empty line of the output |
//! | status | `STATUS:` | implied by score, else `acceptable` |
//! | score | `SCORE:` | none |
//! | rationale | `REASONING:` block | first 500 characters of the output |
//! | confidence | `CONFIDENCE:` | `Unknown` |
//! | strengths / issues / priorities | list sections | empty |
//!
//! Only empty output and non-object JSON are rejected; missing structure is
//! never an error.

use super::extraction::{Extraction, Label, parse_score, strip_list_marker};
use crate::agent::identity::AgentIdentity;
use crate::agent::result::{AgentResult, Confidence, Issue, ReviewStatus, Severity};
use crate::core::task::EvaluationMode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Characters of raw output kept as rationale when no `REASONING:` exists
pub const RATIONALE_FALLBACK_CHARS: usize = 500;

/// Raw output returned by an agent invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "lowercase")]
pub enum RawOutput {
    /// Already-parsed structured output
    Structured(Value),
    /// Free-form text
    Text(String),
}

impl RawOutput {
    pub fn text(text: impl Into<String>) -> Self {
        RawOutput::Text(text.into())
    }
}

/// Output that fails even fallback extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Converts raw agent output into canonical [`AgentResult`]s
#[derive(Debug, Clone, Copy)]
pub struct ResponseNormalizer {
    mode: EvaluationMode,
}

impl ResponseNormalizer {
    pub fn new(mode: EvaluationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Normalize one agent's raw output
    pub fn normalize(
        &self,
        agent: &AgentIdentity,
        raw: &RawOutput,
    ) -> Result<AgentResult, NormalizeError> {
        match raw {
            RawOutput::Structured(Value::Object(map)) => self.from_structured(agent, map),
            RawOutput::Structured(Value::String(text)) => self.from_text(agent, text),
            RawOutput::Structured(other) => Err(NormalizeError::Malformed(format!(
                "expected a JSON object, got {}",
                json_type_name(other)
            ))),
            // Embedded JSON that fails validation may be a quoted example,
            // so the labelled text still gets its chance
            RawOutput::Text(text) => match embedded_object(text) {
                Some(map) if has_canonical_field(&map) => self
                    .from_structured(agent, &map)
                    .or_else(|_| self.from_text(agent, text)),
                _ => self.from_text(agent, text),
            },
        }
    }

    fn from_structured(
        &self,
        agent: &AgentIdentity,
        map: &Map<String, Value>,
    ) -> Result<AgentResult, NormalizeError> {
        let score = optional_score(map)?;
        let rationale = optional_str(map, &["reasoning", "rationale", "summary"])?
            .unwrap_or_default()
            .to_string();
        let confidence = optional_str(map, &["confidence"])?
            .map(Confidence::from_label)
            .unwrap_or_default();

        let mut result = match self.mode {
            EvaluationMode::Review => {
                let status = match optional_str(map, &["status", "overallStatus", "overall_status"])? {
                    Some(raw) => raw.parse::<ReviewStatus>().map_err(NormalizeError::Malformed)?,
                    None => score.map(ReviewStatus::from_score).unwrap_or(ReviewStatus::Acceptable),
                };
                AgentResult::review(agent.clone(), status)
            }
            EvaluationMode::Recommendation => {
                let entity = optional_str(
                    map,
                    &["recommended_model", "recommendedModel", "recommendation", "model"],
                )?
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    NormalizeError::Malformed("structured output has no recommended model".into())
                })?;
                AgentResult::recommendation(agent.clone(), entity)
            }
        };

        result.score = score;
        result.rationale = rationale;
        result.confidence = confidence;
        result.issues = structured_issues(map, agent)?;
        result.strengths = string_list(map, &["strengths"])?;
        result.priorities = string_list(
            map,
            &["improvement_priorities", "improvementPriorities", "priorities"],
        )?;
        Ok(result)
    }

    fn from_text(&self, agent: &AgentIdentity, text: &str) -> Result<AgentResult, NormalizeError> {
        if text.trim().is_empty() {
            return Err(NormalizeError::Malformed("empty response".into()));
        }

        let extraction = Extraction::parse(text);
        let score = extraction.get(Label::Score).and_then(parse_score);

        let mut result = match self.mode {
            EvaluationMode::Review => {
                let status = extraction
                    .first_line(Label::Status)
                    .and_then(parse_status_line)
                    .or_else(|| score.map(ReviewStatus::from_score))
                    .unwrap_or(ReviewStatus::Acceptable);
                AgentResult::review(agent.clone(), status)
            }
            EvaluationMode::Recommendation => {
                let entity = extraction
                    .first_line(Label::RecommendedModel)
                    .or_else(|| first_non_empty_line(text))
                    .map(clean_value)
                    .unwrap_or_default();
                AgentResult::recommendation(agent.clone(), entity)
            }
        };

        result.score = score;
        result.rationale = extraction
            .get(Label::Reasoning)
            .map(str::to_string)
            .unwrap_or_else(|| truncate_chars(text.trim(), RATIONALE_FALLBACK_CHARS));
        result.confidence = extraction
            .get(Label::Confidence)
            .map(Confidence::from_label)
            .unwrap_or_default();
        result.strengths = extraction.items(Label::Strengths);
        result.priorities = extraction.items(Label::Priorities);
        result.issues = extraction
            .items(Label::Issues)
            .iter()
            .map(|line| parse_issue_line(line, agent.domain_tag()))
            .collect();
        Ok(result)
    }
}

/// Parse a `STATUS:` line; tolerates trailing prose like `acceptable - minor gaps`
fn parse_status_line(line: &str) -> Option<ReviewStatus> {
    let cleaned = clean_value(line);
    if let Ok(status) = cleaned.parse() {
        return Some(status);
    }
    let lower = cleaned.to_lowercase();
    if lower.contains("needs improvement") || lower.contains("needs-improvement") {
        Some(ReviewStatus::NeedsImprovement)
    } else if lower.starts_with("excellent") {
        Some(ReviewStatus::Excellent)
    } else if lower.starts_with("acceptable") {
        Some(ReviewStatus::Acceptable)
    } else {
        None
    }
}

/// Parse one free-text issue line
///
/// Format: `[severity] description | suggestion`. The severity may also be
/// a leading `critical:` word; lines without a recognizable severity are
/// `minor`. The suggestion may be introduced by `|` or `Suggestion:`.
fn parse_issue_line(line: &str, default_domain: &str) -> Issue {
    let line = line.trim();
    let (severity, rest) = split_severity(line);

    let (description, suggestion) = match rest.split_once(" | ") {
        Some((d, s)) => (d, Some(s)),
        None => match find_ci(rest, "suggestion:") {
            Some(idx) => (&rest[..idx], Some(&rest[idx + "suggestion:".len()..])),
            None => (rest, None),
        },
    };

    let description = description.trim().trim_end_matches(['-', '.', ';']).trim();
    let mut issue = Issue::new(severity, default_domain, description);
    if let Some(suggestion) = suggestion.map(str::trim).filter(|s| !s.is_empty()) {
        issue = issue.with_suggestion(suggestion.trim_start_matches("Suggestion:").trim());
    }
    issue
}

fn split_severity(line: &str) -> (Severity, &str) {
    if let Some(inner) = line.strip_prefix('[')
        && let Some((tag, rest)) = inner.split_once(']')
        && let Ok(severity) = tag.parse::<Severity>()
    {
        return (severity, rest.trim_start_matches([':', '-', ' ']));
    }
    if let Some((head, rest)) = line.split_once(':')
        && let Ok(severity) = head.trim_matches('*').parse::<Severity>()
    {
        return (severity, rest.trim());
    }
    (Severity::Minor, line)
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

fn first_non_empty_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

/// Strip markdown emphasis, backticks and surrounding quotes from a value
fn clean_value(value: &str) -> &str {
    value
        .trim()
        .trim_matches(|c: char| c == '*' || c == '`' || c == '"' || c == '\'')
        .trim()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// First `{...}` block that parses as a JSON object
///
/// Parsing stops at the end of the first value, so trailing prose or a
/// second object after it is ignored.
fn embedded_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Object(map))) => Some(map),
            _ => None,
        }
    })
}

const CANONICAL_FIELDS: &[&str] = &[
    "status",
    "overallStatus",
    "overall_status",
    "score",
    "issues",
    "strengths",
    "recommended_model",
    "recommendedModel",
    "recommendation",
];

fn has_canonical_field(map: &Map<String, Value>) -> bool {
    CANONICAL_FIELDS.iter().any(|key| map.contains_key(*key))
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
    keys.iter().find_map(|key| {
        map.get_key_value(*key)
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
    })
}

fn optional_str<'a>(
    map: &'a Map<String, Value>,
    keys: &[&str],
) -> Result<Option<&'a str>, NormalizeError> {
    match lookup(map, keys) {
        None => Ok(None),
        Some((_, Value::String(s))) => Ok(Some(s.as_str())),
        Some((key, other)) => Err(wrong_type(key, "a string", other)),
    }
}

fn optional_score(map: &Map<String, Value>) -> Result<Option<u8>, NormalizeError> {
    match lookup(map, &["score"]) {
        None => Ok(None),
        Some((_, Value::Number(n))) => Ok(n
            .as_f64()
            .map(|v| v.round().clamp(0.0, 100.0) as u8)),
        Some((key, other)) => Err(wrong_type(key, "a number", other)),
    }
}

fn string_list(map: &Map<String, Value>, keys: &[&str]) -> Result<Vec<String>, NormalizeError> {
    match lookup(map, keys) {
        None => Ok(Vec::new()),
        Some((key, Value::Array(items))) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(strip_list_marker(s).to_string()),
                other => Err(wrong_type(key, "an array of strings", other)),
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect(),
        Some((key, other)) => Err(wrong_type(key, "an array", other)),
    }
}

fn structured_issues(
    map: &Map<String, Value>,
    agent: &AgentIdentity,
) -> Result<Vec<Issue>, NormalizeError> {
    let items = match lookup(map, &["issues"]) {
        None => return Ok(Vec::new()),
        Some((_, Value::Array(items))) => items,
        Some((key, other)) => return Err(wrong_type(key, "an array", other)),
    };

    items
        .iter()
        .map(|item| match item {
            Value::Object(issue) => {
                let description = optional_str(issue, &["description", "issue", "message"])?
                    .ok_or_else(|| NormalizeError::Malformed("issue has no description".into()))?;
                let severity = match optional_str(issue, &["severity"])? {
                    Some(raw) => raw.parse::<Severity>().map_err(NormalizeError::Malformed)?,
                    None => Severity::Minor,
                };
                let domain = optional_str(issue, &["domain", "category"])?
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| agent.domain_tag());
                let mut parsed = Issue::new(severity, domain, description.trim());
                if let Some(suggestion) = optional_str(issue, &["suggestion", "fix"])? {
                    parsed = parsed.with_suggestion(suggestion.trim());
                }
                Ok(parsed)
            }
            Value::String(line) => Ok(parse_issue_line(line, agent.domain_tag())),
            other => Err(wrong_type("issues", "an array of objects", other)),
        })
        .collect()
}

fn wrong_type(key: &str, expected: &str, got: &Value) -> NormalizeError {
    NormalizeError::Malformed(format!(
        "field `{}` must be {}, got {}",
        key,
        expected,
        json_type_name(got)
    ))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
