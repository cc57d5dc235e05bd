//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use stepwise_domain::OutputFormat as ReportFormat;

/// Output format for task reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plan, every executed step and the outcome
    Full,
    /// Only the final answer
    Answer,
    /// The full report as JSON
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => ReportFormat::Full,
            OutputFormat::Answer => ReportFormat::Answer,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

/// Built-in demonstration queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// ASCII values of INDIA, then the sum of their exponentials
    AsciiSum,
    /// Sum of 5 and 3
    Calculator,
}

impl Demo {
    pub fn query(&self) -> &'static str {
        match self {
            Demo::AsciiSum => {
                "Find the ASCII values of characters in INDIA and then return sum of exponentials of those values."
            }
            Demo::Calculator => "Calculate the sum of 5 and 3.",
        }
    }
}

/// CLI arguments for stepwise
#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(author, version, about = "Plan, call tools step by step, answer")]
#[command(long_about = r#"
stepwise drives a language model through a plan -> execute -> answer loop.

Each turn the model returns exactly one JSON object: a plan, a single
function call, or the final answer. Function calls are checked against the
tool catalog, their parameters coerced to the declared types, and the tool
result is recorded in the execution history shown to the model next turn.

Tools come from the built-in math session and any MCP servers configured
under [[tools.mcp_servers]].

Configuration files are loaded from (in priority order):
1. STEPWISE_<SECTION>__<KEY>            Environment variables
2. --config <path>                      Explicit config file
3. ./stepwise.toml or ./.stepwise.toml  Project-level config
4. ~/.config/stepwise/config.toml       Global config

Example:
  stepwise "Calculate the sum of 5 and 3."
  stepwise --demo ascii-sum -o json
  stepwise --continue-on-error --max-iterations 6 "What is 10 divided by 4?"
"#)]
pub struct Cli {
    /// Queries to run, in order
    pub queries: Vec<String>,

    /// Run a built-in demonstration query
    #[arg(long, value_enum)]
    pub demo: Option<Demo>,

    /// Maximum number of model turns per task
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Seconds to wait for each model response
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Pause between iterations in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Fail the task when the model sends a second plan
    #[arg(long)]
    pub strict_plans: bool,

    /// Record failed tool calls and keep going instead of failing the task
    #[arg(long)]
    pub continue_on_error: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Append the JSONL conversation transcript to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,
}

impl Cli {
    /// All queries to run: the demo query first, then positional queries.
    pub fn all_queries(&self) -> Vec<String> {
        self.demo
            .map(|demo| demo.query().to_string())
            .into_iter()
            .chain(self.queries.iter().cloned())
            .collect()
    }
}
