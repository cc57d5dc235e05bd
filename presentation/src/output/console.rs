//! Console output formatter for task reports

use colored::Colorize;
use serde_json::Value;
use stepwise_application::{TaskOutcome, TaskReport};
use stepwise_domain::{ExecutionStep, OutputFormat, StepResult};

/// Formats task reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Render a report in the requested format
    pub fn render(report: &TaskReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format(report),
            OutputFormat::Answer => Self::format_answer_only(report),
            OutputFormat::Json => Self::format_json(report),
        }
    }

    /// Format the complete report: plan, steps and outcome
    pub fn format(report: &TaskReport) -> String {
        let history = &report.history;
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Task #{}", report.task_id)));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Query:".cyan().bold(),
            history.user_query()
        ));

        // Plan
        output.push_str(&Self::section_header("Plan"));
        match history.plan() {
            Some(plan) => {
                for step in &plan.steps {
                    output.push_str(&format!(
                        "  {}. {} {}\n",
                        step.step_number,
                        step.description,
                        format!("({})", step.expected_tool).dimmed()
                    ));
                    if !step.reasoning.is_empty() {
                        output.push_str(&format!("     {}\n", step.reasoning.dimmed()));
                    }
                }
            }
            None => output.push_str(&format!("  {}\n", "No plan received".dimmed())),
        }

        // Steps
        output.push_str(&Self::section_header("Executed Steps"));
        if history.steps().is_empty() {
            output.push_str(&format!("  {}\n", "No steps executed".dimmed()));
        }
        for step in history.steps() {
            output.push_str(&Self::format_step(step));
        }

        // Outcome
        output.push_str(&Self::section_header("Outcome"));
        output.push_str(&Self::format_outcome(report));
        output.push_str(&format!(
            "\n{}\n",
            format!(
                "{} iteration(s) in {:.1}s",
                report.iterations,
                report.elapsed.as_secs_f64()
            )
            .dimmed()
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(report: &TaskReport) -> String {
        serde_json::to_string_pretty(&report.to_json()).unwrap_or_else(|_| "{}".to_string())
    }

    /// The final answer only, or the reason there is none
    pub fn format_answer_only(report: &TaskReport) -> String {
        match (report.final_answer(), &report.outcome) {
            (Some(answer), _) => format!("{}\n", answer.result_text()),
            (None, TaskOutcome::Failed(e)) => format!("{} {}\n", "Failed:".red().bold(), e),
            (None, _) => format!(
                "{} no final answer after {} iteration(s)\n",
                "Exhausted:".yellow().bold(),
                report.iterations
            ),
        }
    }

    fn format_step(step: &ExecutionStep) -> String {
        let tag = format!("[{}]", step.reasoning_tag.as_str());
        let call = format!(
            "{}({})",
            step.tool_name,
            Self::format_arguments(if step.coerced_arguments.is_empty() {
                &step.raw_parameters
            } else {
                &step.coerced_arguments
            })
        );

        let mut output = format!(
            "  {} {} {}\n",
            format!("{}.", step.iteration).bold(),
            tag.magenta(),
            call.yellow()
        );
        match &step.result {
            StepResult::Output(out) => {
                output.push_str(&format!("     {} {}\n", "->".green(), out.summary()));
            }
            StepResult::Error { error, output: out } => {
                output.push_str(&format!("     {} {}\n", "x".red(), error.red()));
                if let Some(out) = out {
                    output.push_str(&format!("       {}\n", out.summary().dimmed()));
                }
            }
        }
        if !step.reasoning.is_empty() {
            output.push_str(&format!("     {}\n", step.reasoning.dimmed()));
        }
        output
    }

    fn format_arguments(arguments: &serde_json::Map<String, Value>) -> String {
        arguments
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_outcome(report: &TaskReport) -> String {
        match &report.outcome {
            TaskOutcome::Answered => {
                let mut output = format!("{}\n", "Answered".green().bold());
                if let Some(answer) = report.final_answer() {
                    output.push_str(&format!(
                        "\n{} {}\n",
                        "Result:".cyan().bold(),
                        answer.result_text()
                    ));
                    if !answer.summary.is_empty() {
                        output.push_str(&format!("{} {}\n", "Summary:".cyan().bold(), answer.summary));
                    }
                }
                output
            }
            TaskOutcome::Exhausted => format!(
                "{} no final answer within {} iteration(s)\n",
                "Exhausted:".yellow().bold(),
                report.iterations
            ),
            TaskOutcome::Failed(e) => {
                let mut output = format!(
                    "{} {} {}\n",
                    "Failed:".red().bold(),
                    e,
                    format!("({})", e.category()).dimmed()
                );
                if let Some(raw) = &report.last_response {
                    output.push_str(&format!(
                        "\n{}\n{}\n",
                        "Last model response:".dimmed(),
                        Self::indent(raw, "  ")
                    ));
                }
                output
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use std::time::Duration;
    use stepwise_application::TaskError;
    use stepwise_domain::{
        ExecutionHistory, FinalAnswer, Plan, PlanStep, ReasoningTag, ToolOutput,
    };

    fn report(outcome: TaskOutcome, answered: bool) -> TaskReport {
        let mut history = ExecutionHistory::new("Calculate the sum of 5 and 3.");
        history
            .set_plan(Plan::new(vec![PlanStep {
                step_number: 1,
                description: "Add the numbers".to_string(),
                reasoning: "Simple sum".to_string(),
                expected_tool: "add".to_string(),
            }]))
            .unwrap();
        let mut args = Map::new();
        args.insert("a".to_string(), json!(5));
        args.insert("b".to_string(), json!(3));
        history
            .append_step(ExecutionStep {
                iteration: 2,
                tool_name: "add".to_string(),
                raw_parameters: args.clone(),
                coerced_arguments: args,
                reasoning_tag: ReasoningTag::Arithmetic,
                reasoning: "sum".to_string(),
                result: StepResult::Output(ToolOutput::TextItems(vec!["8".to_string()])),
                timestamp_ms: 0,
            })
            .unwrap();
        if answered {
            history
                .finalize(FinalAnswer::new(json!(8), "5 + 3 = 8"))
                .unwrap();
        }

        TaskReport {
            task_id: 1,
            outcome,
            history,
            iterations: 3,
            last_response: Some("{\"final_answer\": {}}".to_string()),
            started_at: chrono::Utc::now(),
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_full_format_lists_plan_steps_and_answer() {
        let text = ConsoleFormatter::format(&report(TaskOutcome::Answered, true));
        assert!(text.contains("Calculate the sum of 5 and 3."));
        assert!(text.contains("Add the numbers"));
        assert!(text.contains("[ARITHMETIC]"));
        assert!(text.contains("add(a=5, b=3)"));
        assert!(text.contains("5 + 3 = 8"));
        assert!(text.contains("3 iteration(s) in 1.5s"));
    }

    #[test]
    fn test_answer_only() {
        assert_eq!(
            ConsoleFormatter::render(&report(TaskOutcome::Answered, true), OutputFormat::Answer),
            "8\n"
        );

        let failed = report(
            TaskOutcome::Failed(TaskError::ToolNotFound("paint".to_string())),
            false,
        );
        assert!(ConsoleFormatter::format_answer_only(&failed).contains("Tool not found: paint"));

        let exhausted = report(TaskOutcome::Exhausted, false);
        assert!(ConsoleFormatter::format_answer_only(&exhausted).contains("after 3 iteration(s)"));
    }

    #[test]
    fn test_failed_report_shows_last_response() {
        let failed = report(TaskOutcome::Failed(TaskError::DuplicatePlan), false);
        let text = ConsoleFormatter::format(&failed);
        assert!(text.contains("duplicate_plan"));
        assert!(text.contains("  {\"final_answer\": {}}"));
    }

    #[test]
    fn test_json_format() {
        let text = ConsoleFormatter::render(&report(TaskOutcome::Answered, true), OutputFormat::Json);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["outcome"], "answered");
        assert_eq!(value["history"]["final_answer"]["result"], 8);
        assert_eq!(value["elapsed_ms"], 1500);
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
