//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use verdict_domain::OutputFormat;

/// Output format flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Colored human-readable report
    Text,
    /// Pretty-printed JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for verdict
#[derive(Parser, Debug)]
#[command(name = "verdict")]
#[command(author, version, about = "Multi-agent evaluation - several agents judge, one verdict")]
#[command(long_about = r#"
Verdict sends one task to several independent agents and reduces their
answers into a single decision.

  review     Domain reviewers judge a work item; any needs-improvement wins
  recommend  Providers recommend a model tier; the majority tier wins
  batch      Evaluate a file of tasks one after another

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./verdict.toml      Project-level config
3. ~/.config/verdict/config.toml   Global config

Environment variables prefixed with VERDICT_ override every file, using
__ to separate sections (VERDICT_DISPATCH__MAX_CONCURRENCY=8).

Example:
  verdict review --file story-42.md --work-item story-42
  verdict review --file story.md -a validator-general -a validator-api
  verdict recommend "Which model should write release notes?" --baseline haiku
  verdict batch tasks.jsonl --format json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Review a work item with domain-specialist agents
    Review(ReviewArgs),
    /// Ask several providers for a recommendation and measure agreement
    Recommend(RecommendArgs),
    /// Evaluate every task in a JSON or JSON Lines file
    Batch(BatchArgs),
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Work item text to review
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub subject: Option<String>,

    /// Read the work item from a file
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Task id (defaults to the work item id, then the file stem)
    #[arg(long)]
    pub id: Option<String>,

    /// Work item id used to remember which agents review it
    #[arg(short, long, value_name = "ID")]
    pub work_item: Option<String>,

    /// Agents to use instead of the remembered selection
    /// (`name` or `category:name`, repeatable)
    #[arg(short, long = "agent", value_name = "AGENT")]
    pub agents: Vec<String>,

    /// Instructions sent ahead of the work item
    #[arg(long)]
    pub instructions: Option<String>,
}

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// The question each provider answers
    pub question: String,

    /// Providers to ask (repeatable; defaults to [agents] providers)
    #[arg(short, long = "provider", value_name = "PROVIDER")]
    pub providers: Vec<String>,

    /// Baseline entity to compare the majority against
    #[arg(long, value_name = "ENTITY")]
    pub baseline: Option<String>,

    /// Task id
    #[arg(long, default_value = "recommendation")]
    pub id: String,

    /// Instructions sent ahead of the question
    #[arg(long)]
    pub instructions: Option<String>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON array or JSON Lines file of tasks
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show configuration file locations
    Sources,
    /// Print the merged configuration as TOML
    Show,
    /// Validate the merged configuration
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_review_with_agents() {
        let cli = Cli::parse_from([
            "verdict",
            "review",
            "--subject",
            "As a user I can log in",
            "-a",
            "validator-api",
            "-a",
            "universal:validator-general",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Review(args) => {
                assert_eq!(args.subject.as_deref(), Some("As a user I can log in"));
                assert_eq!(args.agents.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_review_requires_subject_or_file() {
        assert!(Cli::try_parse_from(["verdict", "review"]).is_err());
        assert!(
            Cli::try_parse_from(["verdict", "review", "--subject", "x", "--file", "y"]).is_err()
        );
    }

    #[test]
    fn test_parse_recommend_with_format() {
        let cli = Cli::parse_from([
            "verdict",
            "--format",
            "json",
            "recommend",
            "Which model?",
            "-p",
            "claude-haiku",
            "--baseline",
            "haiku",
        ]);
        assert_eq!(cli.format.map(OutputFormat::from), Some(OutputFormat::Json));
        match cli.command {
            Command::Recommend(args) => {
                assert_eq!(args.question, "Which model?");
                assert_eq!(args.providers, vec!["claude-haiku"]);
                assert_eq!(args.baseline.as_deref(), Some("haiku"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::parse_from(["verdict", "config", "validate", "--no-config"]);
        assert!(cli.no_config);
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Validate)));
    }
}
