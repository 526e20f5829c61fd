//! CLI entrypoint for verdict
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use verdict_application::{
    AgentInvoker, EvaluateUseCase, NoProgress, ProgressNotifier, SelectionCache,
};
use verdict_domain::{
    AgentCategory, AgentIdentity, EvaluationMode, EvaluationTask, OutputFormat,
};
use verdict_infrastructure::{
    CommandInvoker, ConfigLoader, FileConfig, JsonSelectionStore, JsonlEvaluationLogger,
    StaticSelectionStrategy, load_batch_file, to_price_table,
};
use verdict_presentation::{
    BatchArgs, Cli, Command, ConfigCommand, ConsoleFormatter, OutputFormatter, ProgressReporter,
    RecommendArgs, ReviewArgs, formatter_for, set_color,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting verdict");

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    set_color(!cli.no_color && config.output.color);

    if let Command::Config(command) = &cli.command {
        return run_config(command, &cli, &config);
    }

    let warnings = config.ensure_valid()?;
    if !warnings.is_empty() {
        eprint!("{}", ConsoleFormatter::format_config_issues(&warnings));
    }

    let format = cli
        .format
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();
    let formatter = formatter_for(format);

    // === Dependency Injection ===
    let invoker = Arc::new(
        CommandInvoker::new(config.agents.command.clone())
            .with_overrides(config.agents.commands.clone()),
    );
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());
    let use_case = build_use_case(invoker, &config, cancel);

    let progress: Box<dyn ProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    match &cli.command {
        Command::Review(args) => {
            run_review(args, &use_case, progress.as_ref(), formatter.as_ref(), format).await
        }
        Command::Recommend(args) => {
            run_recommend(
                args,
                &config,
                &use_case,
                progress.as_ref(),
                formatter.as_ref(),
                format,
            )
            .await
        }
        Command::Batch(args) => {
            run_batch(args, &config, &use_case, progress.as_ref(), formatter.as_ref()).await
        }
        Command::Config(command) => run_config(command, &cli, &config),
    }
}

/// Initialize logging based on verbosity level
///
/// `RUST_LOG` wins over `-v` when set. With `--log-file` diagnostics go
/// to that file through a non-blocking writer instead of stderr.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file must name a file: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// Cancel in-flight evaluations on Ctrl-C; completed results are kept
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling in-flight agents");
            cancel.cancel();
        }
    });
}

fn build_use_case<I: AgentInvoker + 'static>(
    invoker: Arc<I>,
    config: &FileConfig,
    cancel: CancellationToken,
) -> EvaluateUseCase<I> {
    // Issues were already reported by ensure_valid
    let (params, _) = config.dispatch.to_dispatch_params();
    let (vocabulary, _) = config.tiers.to_vocabulary();
    let (prices, _) = to_price_table(&config.pricing);
    let prices = prices.with_agent_models(&config.agents.models);
    let (rules, _) = config.selection.to_rules();

    let store = Arc::new(JsonSelectionStore::new(config.selection.store.clone()));
    let strategy = Arc::new(StaticSelectionStrategy::new(rules));

    let mut use_case = EvaluateUseCase::new(invoker, params)
        .with_vocabulary(vocabulary)
        .with_prices(prices)
        .with_selection(SelectionCache::new(store), strategy)
        .with_cancellation(cancel);

    if let Some(path) = &config.logging.evaluation_log {
        match JsonlEvaluationLogger::new(path) {
            Some(logger) => {
                info!("Writing evaluation log to {}", logger.path().display());
                use_case = use_case.with_logger(Arc::new(logger));
            }
            None => warn!("Evaluation log disabled: cannot open {}", path.display()),
        }
    }

    use_case
}

fn parse_agents(specs: &[String], default_category: AgentCategory) -> Result<Vec<AgentIdentity>> {
    specs
        .iter()
        .map(|spec| AgentIdentity::parse(spec, default_category).map_err(|e| anyhow!(e)))
        .collect()
}

/// Providers named in `[agents] providers`
fn default_providers(config: &FileConfig) -> Vec<AgentIdentity> {
    config.agents.parse_providers().0
}

async fn run_review<I: AgentInvoker + 'static>(
    args: &ReviewArgs,
    use_case: &EvaluateUseCase<I>,
    progress: &dyn ProgressNotifier,
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
) -> Result<()> {
    let subject = match (&args.subject, &args.file) {
        (Some(subject), _) => subject.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read work item {}", path.display()))?,
        (None, None) => bail!("Provide the work item with --subject or --file"),
    };

    let id = args
        .id
        .clone()
        .or_else(|| args.work_item.clone())
        .or_else(|| file_stem(args.file.as_ref()))
        .unwrap_or_else(|| "review".to_string());

    let mut task = EvaluationTask::review(id, subject)?;
    if let Some(instructions) = &args.instructions {
        task = task.with_instructions(instructions.clone());
    }
    if let Some(work_item) = &args.work_item {
        task = task.with_work_item(work_item.clone());
    }

    let agents = if args.agents.is_empty() {
        use_case.select_agents(&task).await?
    } else {
        parse_agents(&args.agents, AgentCategory::Domain)?
    };

    let outcome = use_case
        .evaluate_review_with_progress(&task, &agents, progress)
        .await?;

    println!("{}", formatter.format_review(&outcome));
    if format == OutputFormat::Text {
        println!("{}", formatter.format_cost(&use_case.cost_summary()));
    }
    Ok(())
}

async fn run_recommend<I: AgentInvoker + 'static>(
    args: &RecommendArgs,
    config: &FileConfig,
    use_case: &EvaluateUseCase<I>,
    progress: &dyn ProgressNotifier,
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
) -> Result<()> {
    let mut task = EvaluationTask::recommendation(args.id.clone(), args.question.clone())?;
    if let Some(instructions) = &args.instructions {
        task = task.with_instructions(instructions.clone());
    }
    if let Some(baseline) = &args.baseline {
        task = task.with_baseline(baseline.clone());
    }

    let providers = if args.providers.is_empty() {
        default_providers(config)
    } else {
        parse_agents(&args.providers, AgentCategory::Provider)?
    };

    let outcome = use_case
        .evaluate_recommendation_with_progress(&task, &providers, progress)
        .await?;

    println!("{}", formatter.format_recommendation(&outcome));
    if format == OutputFormat::Text {
        println!("{}", formatter.format_cost(&use_case.cost_summary()));
    }
    Ok(())
}

async fn run_batch<I: AgentInvoker + 'static>(
    args: &BatchArgs,
    config: &FileConfig,
    use_case: &EvaluateUseCase<I>,
    progress: &dyn ProgressNotifier,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let mut entries = load_batch_file(&args.file)
        .with_context(|| format!("Failed to load batch file {}", args.file.display()))?;

    // Recommendation tasks without agents ask the default providers;
    // review tasks without agents use the remembered selection
    let providers = default_providers(config);
    for entry in &mut entries {
        if entry.agents.is_empty() && entry.task.mode() == EvaluationMode::Recommendation {
            entry.agents = providers.clone();
        }
    }

    let summary = use_case.evaluate_batch_with_progress(entries, progress).await;
    println!("{}", formatter.format_batch(&summary));

    if !summary.tasks.is_empty() && summary.succeeded_tasks() == 0 {
        bail!("Every task in the batch failed");
    }
    Ok(())
}

fn run_config(command: &ConfigCommand, cli: &Cli, config: &FileConfig) -> Result<()> {
    match command {
        ConfigCommand::Sources => {
            if cli.no_config {
                println!("Configuration files disabled (--no-config)");
            }
            for source in ConfigLoader::sources(cli.config.as_ref()) {
                let marker = if source.found { "found" } else { "missing" };
                println!("{:<10} {:<8} {}", source.label, marker, source.path.display());
            }
            println!("{:<10} {:<8} VERDICT_* (sections split by __)", "Env", "-");
        }
        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
            print!("{}", rendered);
        }
        ConfigCommand::Validate => {
            let issues = config.validate();
            if issues.is_empty() {
                println!("Configuration is valid");
                return Ok(());
            }
            print!("{}", ConsoleFormatter::format_config_issues(&issues));
            if issues.iter().any(|i| i.is_error()) {
                bail!("Configuration has errors");
            }
        }
    }
    Ok(())
}

fn file_stem(path: Option<&PathBuf>) -> Option<String> {
    path.and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
}
