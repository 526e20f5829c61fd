//! Agent identity value object

use serde::{Deserialize, Serialize};

/// How an agent identity gets selected for a work item
///
/// Categories drive selection policy only; evaluation treats every
/// identity the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentCategory {
    /// Always applied
    Universal,
    /// Applied when the inferred tech stack matches
    Domain,
    /// Applied when inferred feature keywords match
    Feature,
    /// A model provider queried for a recommendation
    Provider,
}

impl AgentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCategory::Universal => "universal",
            AgentCategory::Domain => "domain",
            AgentCategory::Feature => "feature",
            AgentCategory::Provider => "provider",
        }
    }
}

impl std::fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "universal" => Ok(AgentCategory::Universal),
            "domain" => Ok(AgentCategory::Domain),
            "feature" => Ok(AgentCategory::Feature),
            "provider" => Ok(AgentCategory::Provider),
            other => Err(format!(
                "Unknown agent category: {}. Valid: universal, domain, feature, provider",
                other
            )),
        }
    }
}

/// A named agent role (Value Object)
///
/// # Example
///
/// ```
/// use verdict_domain::{AgentCategory, AgentIdentity};
///
/// let validator = AgentIdentity::domain("validator-security");
/// assert_eq!(validator.domain_tag(), "security");
///
/// let parsed = AgentIdentity::parse("feature:payments-validator", AgentCategory::Universal).unwrap();
/// assert_eq!(parsed.category, AgentCategory::Feature);
/// assert_eq!(parsed.domain_tag(), "payments");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Validator name or provider name (e.g. "validator-api", "claude-sonnet")
    pub name: String,
    pub category: AgentCategory,
}

impl AgentIdentity {
    pub fn new(name: impl Into<String>, category: AgentCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }

    pub fn universal(name: impl Into<String>) -> Self {
        Self::new(name, AgentCategory::Universal)
    }

    pub fn domain(name: impl Into<String>) -> Self {
        Self::new(name, AgentCategory::Domain)
    }

    pub fn feature(name: impl Into<String>) -> Self {
        Self::new(name, AgentCategory::Feature)
    }

    pub fn provider(name: impl Into<String>) -> Self {
        Self::new(name, AgentCategory::Provider)
    }

    /// Parse `category:name`, or a bare `name` with the given default category
    pub fn parse(spec: &str, default_category: AgentCategory) -> Result<Self, String> {
        let spec = spec.trim();
        let (category, name) = match spec.split_once(':') {
            Some((prefix, name)) => (prefix.parse()?, name.trim()),
            None => (default_category, spec),
        };
        if name.is_empty() {
            return Err(format!("Agent name cannot be empty: '{}'", spec));
        }
        Ok(Self::new(name, category))
    }

    /// Domain tag derived from the identity name
    ///
    /// Strips a leading `validator-` and a trailing `-validator` or
    /// `-reviewer`; names without those affixes are returned unchanged.
    pub fn domain_tag(&self) -> &str {
        let name = self.name.as_str();
        let name = name.strip_prefix("validator-").unwrap_or(name);
        let name = name
            .strip_suffix("-validator")
            .or_else(|| name.strip_suffix("-reviewer"))
            .unwrap_or(name);
        if name.is_empty() { &self.name } else { name }
    }
}

impl std::fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_tag() {
        assert_eq!(AgentIdentity::domain("validator-security").domain_tag(), "security");
        assert_eq!(AgentIdentity::domain("api-validator").domain_tag(), "api");
        assert_eq!(AgentIdentity::feature("ux-reviewer").domain_tag(), "ux");
        assert_eq!(AgentIdentity::provider("claude").domain_tag(), "claude");
        assert_eq!(AgentIdentity::universal("validator-").domain_tag(), "validator-");
    }

    #[test]
    fn test_parse_with_prefix() {
        let id = AgentIdentity::parse("domain:validator-db", AgentCategory::Provider).unwrap();
        assert_eq!(id.category, AgentCategory::Domain);
        assert_eq!(id.name, "validator-db");
    }

    #[test]
    fn test_parse_bare_name_uses_default() {
        let id = AgentIdentity::parse("gpt-4o", AgentCategory::Provider).unwrap();
        assert_eq!(id.category, AgentCategory::Provider);
        assert_eq!(id.to_string(), "gpt-4o");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(AgentIdentity::parse("", AgentCategory::Provider).is_err());
        assert!(AgentIdentity::parse("bogus:name", AgentCategory::Provider).is_err());
        assert!(AgentIdentity::parse("domain:", AgentCategory::Provider).is_err());
    }

    #[test]
    fn test_category_serde() {
        let id = AgentIdentity::universal("validator-product");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"{"name":"validator-product","category":"universal"}"#);
    }
}
