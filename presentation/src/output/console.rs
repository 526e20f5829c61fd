//! Console output formatter for evaluation results

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use verdict_application::{RecommendationOutcome, ReviewOutcome};
use verdict_domain::{
    AgentFailure, AgentResult, AgreementLevel, BaselineDelta, BatchSummary, ConfigIssue,
    CostSummary, IssueLevel, ReviewStatus, Severity, TaskOutcome, Verdict,
};

/// Formats evaluation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a review round with its aggregated report
    pub fn format_review(outcome: &ReviewOutcome) -> String {
        let report = &outcome.report;
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Review: {}", outcome.task_id)));
        output.push('\n');

        output.push_str(&format!(
            "\n{} {}   {} {}   {} {}   {}\n",
            "Status:".cyan().bold(),
            Self::status(report.overall_status),
            "Score:".cyan().bold(),
            report
                .average_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            "Validators:".cyan().bold(),
            report.validator_count,
            Self::elapsed(outcome.elapsed_ms).dimmed()
        ));

        output.push_str(&Self::section_header("Agents"));
        for result in &outcome.results {
            output.push_str(&Self::review_line(result));
        }

        if !report.strengths.is_empty() {
            output.push_str(&Self::section_header("Strengths"));
            for strength in &report.strengths {
                output.push_str(&format!("  * {}\n", strength));
            }
        }

        for severity in [Severity::Critical, Severity::Major, Severity::Minor] {
            let issues = report.issues(severity);
            if issues.is_empty() {
                continue;
            }
            let title = format!("{} issues ({})", Self::capitalize(severity.as_str()), issues.len());
            output.push_str(&Self::section_header(&title));
            for tagged in issues {
                output.push_str(&format!(
                    "  {} {} {}\n",
                    Self::severity(severity),
                    format!("[{}]", tagged.domain).yellow(),
                    tagged.issue.description
                ));
                output.push_str(&format!("      {}\n", format!("from {}", tagged.agent).dimmed()));
                if let Some(suggestion) = &tagged.issue.suggestion {
                    output.push_str(&format!("      {} {}\n", "->".green(), suggestion));
                }
            }
        }

        if !report.improvement_priorities.is_empty() {
            output.push_str(&Self::section_header("Improvement priorities"));
            for (i, mention) in report.improvement_priorities.iter().enumerate() {
                output.push_str(&format!(
                    "  {}. {} {}\n",
                    i + 1,
                    mention.priority,
                    format!("(x{})", mention.mentions).dimmed()
                ));
            }
        }

        output.push_str(&Self::failures(&outcome.failures));
        output.push_str(&Self::footer());
        output
    }

    /// Format a recommendation round with its consensus record
    pub fn format_recommendation(outcome: &RecommendationOutcome) -> String {
        let record = &outcome.record;
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Recommendation: {}", outcome.task_id)));
        output.push('\n');

        output.push_str(&format!(
            "\n{} {} {} {} {}   {}\n",
            "Majority:".cyan().bold(),
            record.majority_name().unwrap_or("none").bold(),
            record.vote_summary(),
            record.agreement(),
            format!("({} agreement)", Self::level(record.level)),
            Self::elapsed(outcome.elapsed_ms).dimmed()
        ));

        if let Some(delta) = outcome.baseline {
            output.push_str(&format!(
                "{} {}\n",
                "Baseline:".cyan().bold(),
                Self::baseline(delta)
            ));
        }

        output.push_str(&Self::section_header("Distribution"));
        for count in &record.distribution {
            output.push_str(&format!(
                "  {:<10} {}  {}\n",
                count.tier.name,
                count.votes,
                count.agents.join(", ").dimmed()
            ));
        }

        output.push_str(&Self::section_header("Agents"));
        for result in &outcome.results {
            let value = result.recommendation_value().unwrap_or("-");
            output.push_str(&format!(
                "\n{} {} {}\n",
                format!("── {} ──", result.agent).yellow().bold(),
                value,
                format!("(confidence: {})", result.confidence).dimmed()
            ));
            if !result.rationale.is_empty() {
                output.push_str(&Self::indent(&result.rationale, "  "));
                output.push('\n');
            }
        }

        output.push_str(&Self::failures(&outcome.failures));
        output.push_str(&Self::footer());
        output
    }

    /// Format a batch summary
    pub fn format_batch(summary: &BatchSummary) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Batch Results"));
        output.push('\n');

        output.push_str(&format!(
            "\n{} {} tasks, {} succeeded, {} failed\n",
            "Tasks:".cyan().bold(),
            summary.tasks.len(),
            summary.succeeded_tasks().to_string().green(),
            if summary.failed_tasks > 0 {
                summary.failed_tasks.to_string().red()
            } else {
                summary.failed_tasks.to_string().normal()
            }
        ));

        output.push_str(&Self::section_header("Tasks"));
        for task in &summary.tasks {
            let detail = match &task.outcome {
                TaskOutcome::Review { report, .. } => format!(
                    "{} (score {})",
                    Self::status(report.overall_status),
                    report
                        .average_score
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "n/a".to_string())
                ),
                TaskOutcome::Recommendation {
                    record, baseline, ..
                } => {
                    let mut detail = format!(
                        "{} {} {}",
                        record.majority_name().unwrap_or("none").bold(),
                        Self::level(record.level),
                        record.agreement()
                    );
                    if let Some(delta) = baseline {
                        detail.push_str(&format!(", {}", Self::baseline(*delta)));
                    }
                    detail
                }
                TaskOutcome::Failed { error, .. } => error.red().to_string(),
            };
            let marker = if task.outcome.is_failed() {
                "x".red()
            } else {
                "v".green()
            };
            output.push_str(&format!(
                "  {} {:<20} {:<15} {}  {}\n",
                marker,
                task.task_id,
                task.mode.as_str(),
                detail,
                Self::elapsed(task.elapsed_ms).dimmed()
            ));
            let failures = task.outcome.failures();
            if !failures.is_empty() && !task.outcome.is_failed() {
                output.push_str(&format!(
                    "      {}\n",
                    format!("{} agent failure(s)", failures.len()).yellow()
                ));
            }
        }

        let rate = &summary.consensus_rate;
        if rate.tasks > 0 {
            output.push_str(&Self::section_header("Consensus rate"));
            output.push_str(&format!(
                "  full {}  partial {}  none {}  single {}  {}\n",
                Self::percent(rate.full),
                Self::percent(rate.partial),
                Self::percent(rate.none),
                Self::percent(rate.single),
                format!("(of {} recommendation tasks)", rate.tasks).dimmed()
            ));
        }

        if summary.baseline.total() > 0 {
            output.push_str(&Self::section_header("Baseline comparison"));
            output.push_str(&format!(
                "  {} upgrade, {} downgrade, {} match\n",
                summary.baseline.upgrades,
                summary.baseline.downgrades,
                summary.baseline.matches
            ));
        }

        output.push_str(&Self::format_cost(&summary.cost));
        output.push_str(&Self::footer());
        output
    }

    /// Format cost totals as a per-agent table
    pub fn format_cost(cost: &CostSummary) -> String {
        let mut output = Self::section_header("Cost");
        for (agent, line) in &cost.by_agent {
            output.push_str(&format!(
                "  {:<24} {:>4} calls {:>9} in {:>9} out  ${:.4}\n",
                agent, line.invocations, line.input_tokens, line.output_tokens, line.cost_usd
            ));
        }
        output.push_str(&format!(
            "  {:<24} {:>4} calls {:>9} in {:>9} out  ${:.4}\n",
            "total".bold(),
            cost.total.invocations,
            cost.total.input_tokens,
            cost.total.output_tokens,
            cost.total.cost_usd
        ));
        if cost.wall_time_ms > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                "Wall time:".dimmed(),
                Self::elapsed(cost.wall_time_ms)
            ));
        }
        output
    }

    /// Format configuration issues, errors first
    pub fn format_config_issues(issues: &[ConfigIssue]) -> String {
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|i| !i.is_error());
        sorted
            .into_iter()
            .map(|issue| {
                let label = match issue.level {
                    IssueLevel::Error => "error:".red().bold(),
                    IssueLevel::Warning => "warning:".yellow().bold(),
                };
                format!("{} {}\n", label, issue.message)
            })
            .collect()
    }

    fn review_line(result: &AgentResult) -> String {
        let status = match &result.verdict {
            Verdict::Review(status) => Self::status(*status).to_string(),
            Verdict::Recommendation(value) => value.clone(),
        };
        let score = result
            .score
            .map(|s| format!(" {}", s))
            .unwrap_or_default();
        format!(
            "  {:<28} {}{} {}\n",
            result.agent.name,
            status,
            score,
            format!("({} issues)", result.issues.len()).dimmed()
        )
    }

    fn failures(failures: &[AgentFailure]) -> String {
        if failures.is_empty() {
            return String::new();
        }
        let mut output = Self::section_header(&format!("Failed agents ({})", failures.len()));
        for failure in failures {
            output.push_str(&format!(
                "  {} {} {} {}\n",
                "x".red(),
                failure.agent,
                format!("[{}, {} attempt(s)]", failure.kind, failure.attempts).dimmed(),
                failure.message
            ));
        }
        output
    }

    fn status(status: ReviewStatus) -> ColoredString {
        match status {
            ReviewStatus::Excellent => status.as_str().green().bold(),
            ReviewStatus::Acceptable => status.as_str().yellow().bold(),
            ReviewStatus::NeedsImprovement => status.as_str().red().bold(),
        }
    }

    fn severity(severity: Severity) -> ColoredString {
        match severity {
            Severity::Critical => "!!".red().bold(),
            Severity::Major => "! ".yellow().bold(),
            Severity::Minor => "- ".normal(),
        }
    }

    fn level(level: AgreementLevel) -> ColoredString {
        match level {
            AgreementLevel::Full => level.as_str().green(),
            AgreementLevel::Partial => level.as_str().yellow(),
            AgreementLevel::None => level.as_str().red(),
            AgreementLevel::Single => level.as_str().dimmed(),
        }
    }

    fn baseline(delta: BaselineDelta) -> ColoredString {
        match delta {
            BaselineDelta::Upgrade => "upgrade".green(),
            BaselineDelta::Downgrade => "downgrade".red(),
            BaselineDelta::Match => "match".normal(),
        }
    }

    fn percent(rate: f64) -> String {
        format!("{:.0}%", rate * 100.0)
    }

    fn elapsed(ms: u64) -> String {
        if ms < 1000 {
            format!("{}ms", ms)
        } else {
            format!("{:.1}s", ms as f64 / 1000.0)
        }
    }

    fn capitalize(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_review(&self, outcome: &ReviewOutcome) -> String {
        Self::format_review(outcome)
    }

    fn format_recommendation(&self, outcome: &RecommendationOutcome) -> String {
        Self::format_recommendation(outcome)
    }

    fn format_batch(&self, summary: &BatchSummary) -> String {
        Self::format_batch(summary)
    }

    fn format_cost(&self, cost: &CostSummary) -> String {
        Self::format_cost(cost)
    }
}
