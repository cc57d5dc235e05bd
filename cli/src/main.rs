//! CLI entrypoint for stepwise
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use stepwise_application::{
    ConversationLogger, DuplicatePlanPolicy, ExecutionParams, NoConversationLogger, NoProgress,
    ProgressObserver, RunTaskUseCase, StepFailurePolicy, TaskRunner,
};
use stepwise_infrastructure::{
    ConfigLoader, FileConfig, FileToolsConfig, GeminiBackend, JsonlConversationLogger,
    MathSession, McpSession, ToolRegistry,
};
use stepwise_presentation::{Cli, ConsoleFormatter, ConsoleProgress};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Load configuration
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_tracing(&cli, &config)?;

    let issues = config.validate();
    if !issues.is_empty() {
        let details = issues
            .iter()
            .map(|issue| format!("  - {}", issue))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Invalid configuration:\n{}", details);
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    let queries = cli.all_queries();
    if queries.is_empty() {
        bail!("No query given. Pass one or more queries, or use --demo <ascii-sum|calculator>.");
    }

    info!("Starting stepwise");

    let params = execution_params(&cli, &config)?;
    let format = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();

    // === Dependency Injection ===
    let backend = Arc::new(
        GeminiBackend::from_config(&config.model).context("Failed to set up the model backend")?,
    );
    let registry = Arc::new(build_registry(&config.tools).await?);

    let conversation_logger: Arc<dyn ConversationLogger> = match cli
        .conversation_log
        .as_ref()
        .or(config.logging.conversation_log.as_ref())
    {
        Some(path) => {
            let logger = JsonlConversationLogger::open(path).with_context(|| {
                format!("Failed to open conversation log {}", path.display())
            })?;
            info!("Conversation log: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    };

    let use_case = RunTaskUseCase::new(backend, registry)
        .with_params(params)
        .with_conversation_logger(conversation_logger);

    let observer: Arc<dyn ProgressObserver> = if cli.quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(ConsoleProgress::new())
    };

    // Queue every query up front; the runner processes them in order.
    let runner = TaskRunner::spawn(use_case);
    let mut pending = Vec::with_capacity(queries.len());
    for query in &queries {
        pending.push(runner.submit(query, observer.clone())?);
    }

    let mut any_failed = false;
    for task in pending {
        let report = task.wait().await?;
        any_failed |= report.is_failed();
        println!("{}", ConsoleFormatter::render(&report, format));
    }

    runner.shutdown().await;

    Ok(if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Initialise tracing to stderr, plus a daily rolling file when configured.
///
/// `RUST_LOG` takes precedence over the `-v` count.
fn init_tracing(cli: &Cli, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match &config.logging.file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "stepwise.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Config file values, overridden by command-line flags.
fn execution_params(cli: &Cli, config: &FileConfig) -> Result<ExecutionParams> {
    let mut params = config.execution.to_execution_params()?;

    if let Some(max) = cli.max_iterations {
        if max == 0 {
            bail!("--max-iterations must be at least 1");
        }
        params = params.with_max_iterations(max);
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout must be at least 1 second");
        }
        params = params.with_generation_timeout(Duration::from_secs(secs));
    }
    if let Some(ms) = cli.delay_ms {
        params = params.with_iteration_delay(Duration::from_millis(ms));
    }
    if cli.strict_plans {
        params = params.with_duplicate_plan(DuplicatePlanPolicy::Fail);
    }
    if cli.continue_on_error {
        params = params.with_on_step_failure(StepFailurePolicy::Continue);
    }

    Ok(params)
}

/// Register the built-in math session and every configured MCP server.
///
/// A server that cannot be started is skipped with a warning.
async fn build_registry(tools: &FileToolsConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    if tools.builtin_math {
        registry.register(MathSession::new())?;
    }

    for server in &tools.mcp_servers {
        match McpSession::connect(server).await {
            Ok(session) => {
                info!(server = %server.name, "MCP server connected");
                registry.register(session)?;
            }
            Err(e) => warn!(server = %server.name, error = %e, "Skipping MCP server"),
        }
    }

    registry.discover().await;

    let stats = registry.stats();
    info!(
        sessions = ?registry.session_names(),
        tools = stats.total_tools,
        "Tool catalog ready"
    );
    for (name, error) in registry.failed_sessions() {
        warn!(session = %name, error = %error, "Session contributed no tools");
    }

    Ok(registry)
}
