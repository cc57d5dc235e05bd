//! Console progress for running tasks
//!
//! [`ConsoleProgress`] prints one coloured line per [`TaskStatus`] to stderr
//! and keeps an indicatif spinner running while the model is thinking.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use stepwise_application::ProgressObserver;
use stepwise_domain::{ExecutionHistory, TaskStatus, truncate};

/// Reports task progress with status lines and a spinner
pub struct ConsoleProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message("Waiting for the model...".dimmed().to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut spinner) = self.spinner.lock() {
            *spinner = Some(pb);
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut spinner) = self.spinner.lock()
            && let Some(pb) = spinner.take()
        {
            pb.finish_and_clear();
        }
    }

    /// Status line printed for an update, if any
    pub fn status_line(status: &TaskStatus, history: &ExecutionHistory) -> String {
        match status {
            TaskStatus::Started => format!(
                "{} {}",
                "->".cyan(),
                truncate(history.user_query(), 100).bold()
            ),
            TaskStatus::PlanStored => {
                let steps = history.plan().map(|p| p.len()).unwrap_or(0);
                format!("  {} Plan stored ({} step(s))", "v".green(), steps)
            }
            TaskStatus::StepCompleted { iteration, tool } => {
                let result = history
                    .last_step()
                    .and_then(|step| step.result.output())
                    .map(|out| truncate(&out.summary(), 80))
                    .unwrap_or_default();
                format!(
                    "  {} [{}] {} {} {}",
                    "v".green(),
                    iteration,
                    tool.yellow(),
                    "->".dimmed(),
                    result
                )
            }
            TaskStatus::StepFailed { iteration, tool } => {
                let error = history
                    .last_step()
                    .and_then(|step| step.result.error_message().map(str::to_string))
                    .unwrap_or_default();
                format!(
                    "  {} [{}] {} {}",
                    "x".red(),
                    iteration,
                    tool.yellow(),
                    truncate(&error, 80).red()
                )
            }
            TaskStatus::Answered => {
                let answer = history
                    .final_answer()
                    .map(|a| a.result_text())
                    .unwrap_or_default();
                format!("  {} Answer: {}", "v".green(), answer.bold())
            }
            TaskStatus::Exhausted => format!(
                "  {} Iteration budget used up without a final answer",
                "!".yellow()
            ),
            TaskStatus::Failed { reason } => format!("  {} {}", "x".red(), reason.red()),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, status: &TaskStatus, history: &ExecutionHistory) {
        self.stop_spinner();
        eprintln!("{}", Self::status_line(status, history));
        if !status.is_final() {
            self.start_spinner();
        }
    }
}
