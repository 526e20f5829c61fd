//! Configuration issues detected while validating loaded settings.
//!
//! Loaders never fail on a suspicious value; they report a [`ConfigIssue`]
//! and fall back to a default so the caller can decide how loud to be.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A numeric setting is zero where at least one is required.
    ZeroValue { field: String },
    /// The tier vocabulary has no usable entries.
    EmptyTierVocabulary,
    /// The same model appears in more than one pricing row.
    DuplicatePricing { model: String },
    /// A price is negative or not a number.
    InvalidPrice { model: String },
    /// A string could not be parsed into the expected enum.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub level: IssueLevel,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }
}
