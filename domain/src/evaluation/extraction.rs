//! Label-anchored extraction grammar for free-text agent output.
//!
//! Free-text agents are asked to answer in labelled sections:
//!
//! ```text
//! RECOMMENDED MODEL: claude-sonnet
//! REASONING: The story is a CRUD endpoint with no
//! architectural decisions.
//! CONFIDENCE: High
//! ```
//!
//! # Grammar
//!
//! | Rule | Definition |
//! |------|------------|
//! | label line | optional decoration (`#`, `*`, `>`, `-`, whitespace), a declared [`Label`] keyword (case-insensitive), optional `*`, then `:` |
//! | section | inline text after the `:` plus every following line up to the next label line or end of text |
//! | list item | a section line with a bullet (`-`, `*`, `•`) or numbering (`1.`, `2)`) stripped |
//!
//! Only the first occurrence of a label counts; later repeats are folded
//! into the preceding section. Lines before the first label belong to no
//! section and are only used by the fallbacks in
//! [`normalizer`](super::normalizer).

/// Declared section labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    RecommendedModel,
    Status,
    Score,
    Reasoning,
    Confidence,
    Strengths,
    Issues,
    Priorities,
}

impl Label {
    pub const ALL: [Label; 8] = [
        Label::RecommendedModel,
        Label::Status,
        Label::Score,
        Label::Reasoning,
        Label::Confidence,
        Label::Strengths,
        Label::Issues,
        Label::Priorities,
    ];

    /// Keywords accepted for this label; the first is canonical
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Label::RecommendedModel => &["RECOMMENDED MODEL", "RECOMMENDATION"],
            Label::Status => &["STATUS", "VERDICT"],
            Label::Score => &["SCORE"],
            Label::Reasoning => &["REASONING", "RATIONALE"],
            Label::Confidence => &["CONFIDENCE"],
            Label::Strengths => &["STRENGTHS"],
            Label::Issues => &["ISSUES"],
            Label::Priorities => &["IMPROVEMENT PRIORITIES", "PRIORITIES"],
        }
    }
}

/// Sections found in one free-text response
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    sections: Vec<(Label, String)>,
}

impl Extraction {
    /// Run the grammar over `text`
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<(Label, String)> = Vec::new();
        let mut current: Option<usize> = None;

        for line in text.lines() {
            if let Some((label, inline)) = match_label(line)
                && !sections.iter().any(|(l, _)| *l == label)
            {
                sections.push((label, inline.to_string()));
                current = Some(sections.len() - 1);
                continue;
            }
            if let Some(idx) = current {
                let body = &mut sections[idx].1;
                body.push('\n');
                body.push_str(line);
            }
        }

        for (_, body) in &mut sections {
            *body = body.trim().to_string();
        }

        Self { sections }
    }

    /// Trimmed section text, or `None` if the label is absent or empty
    pub fn get(&self, label: Label) -> Option<&str> {
        self.sections
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, body)| body.as_str())
            .filter(|body| !body.is_empty())
    }

    /// First line of a section
    pub fn first_line(&self, label: Label) -> Option<&str> {
        self.get(label)
            .and_then(|body| body.lines().map(str::trim).find(|l| !l.is_empty()))
    }

    /// Section lines as list items (bullets and numbering stripped)
    pub fn items(&self, label: Label) -> Vec<String> {
        self.get(label)
            .map(|body| {
                body.lines()
                    .map(strip_list_marker)
                    .filter(|item| !item.is_empty() && !is_none_marker(item))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Match a label line, returning the label and the inline text after `:`
fn match_label(line: &str) -> Option<(Label, &str)> {
    let stripped = line.trim_start_matches(|c: char| {
        c.is_whitespace() || c == '#' || c == '*' || c == '>' || c == '-'
    });

    for label in Label::ALL {
        for keyword in label.keywords() {
            let Some(head) = stripped.get(..keyword.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(keyword) {
                continue;
            }
            let rest = stripped[keyword.len()..].trim_start_matches('*').trim_start();
            if let Some(inline) = rest.strip_prefix(':') {
                return Some((label, inline.trim_start_matches('*').trim()));
            }
        }
    }
    None
}

/// Strip a leading bullet or `N.` / `N)` numbering
pub fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return rest.trim();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }
    line
}

fn is_none_marker(item: &str) -> bool {
    matches!(item.to_lowercase().as_str(), "none" | "n/a" | "none.")
}

/// Parse a score section into 0-100
///
/// Accepts `85`, `85/100`, `8/10` (scaled by 10) and `85%`. The first
/// number in the text wins.
pub fn parse_score(text: &str) -> Option<u8> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let digits_len = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    let value: f64 = rest[..digits_len].trim_end_matches('.').parse().ok()?;
    let after = rest[digits_len..].trim_start();

    let scaled = match after.strip_prefix('/') {
        Some(denominator) => {
            let den_len = denominator
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(denominator.len());
            match denominator[..den_len].parse::<f64>() {
                Ok(den) if den > 0.0 => value / den * 100.0,
                _ => value,
            }
        }
        None => value,
    };

    Some(scaled.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labelled_sections() {
        let text = "RECOMMENDED MODEL: claude-sonnet\nREASONING: Simple CRUD work.\nNo design needed.\nCONFIDENCE: High";
        let extraction = Extraction::parse(text);

        assert_eq!(extraction.get(Label::RecommendedModel), Some("claude-sonnet"));
        assert_eq!(
            extraction.get(Label::Reasoning),
            Some("Simple CRUD work.\nNo design needed.")
        );
        assert_eq!(extraction.get(Label::Confidence), Some("High"));
        assert!(extraction.get(Label::Score).is_none());
    }

    #[test]
    fn test_labels_are_case_insensitive_and_decorated() {
        let text = "## Recommended Model: opus\n**Reasoning:** needs architecture work\n- **Confidence**: medium";
        let extraction = Extraction::parse(text);

        assert_eq!(extraction.get(Label::RecommendedModel), Some("opus"));
        assert_eq!(extraction.get(Label::Reasoning), Some("needs architecture work"));
        assert_eq!(extraction.get(Label::Confidence), Some("medium"));
    }

    #[test]
    fn test_label_requires_colon() {
        let text = "Recommendations are hard.\nSTATUS: acceptable";
        let extraction = Extraction::parse(text);
        assert!(extraction.get(Label::RecommendedModel).is_none());
        assert_eq!(extraction.get(Label::Status), Some("acceptable"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "STATUS: excellent\nSTATUS: needs-improvement";
        let extraction = Extraction::parse(text);
        assert_eq!(extraction.first_line(Label::Status), Some("excellent"));
    }

    #[test]
    fn test_block_section_items() {
        let text = "STRENGTHS:\n- Clear scope\n* Good naming\n1. Testable\nISSUES: none";
        let extraction = Extraction::parse(text);

        assert_eq!(
            extraction.items(Label::Strengths),
            vec!["Clear scope", "Good naming", "Testable"]
        );
        assert!(extraction.items(Label::Issues).is_empty());
    }

    #[test]
    fn test_text_without_labels() {
        let extraction = Extraction::parse("Just use sonnet, it's fine.");
        assert!(extraction.is_empty());
    }

    #[test]
    fn test_parse_score_formats() {
        assert_eq!(parse_score("85"), Some(85));
        assert_eq!(parse_score("85/100"), Some(85));
        assert_eq!(parse_score("8/10"), Some(80));
        assert_eq!(parse_score("about 72% overall"), Some(72));
        assert_eq!(parse_score("7.5/10"), Some(75));
        assert_eq!(parse_score("150"), Some(100));
        assert_eq!(parse_score("no idea"), None);
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("- item"), "item");
        assert_eq!(strip_list_marker("12) item"), "item");
        assert_eq!(strip_list_marker("2024 roadmap"), "2024 roadmap");
    }
}
