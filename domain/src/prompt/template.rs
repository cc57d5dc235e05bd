//! Prompt template for the plan → execute → answer loop

use crate::agent::history::ExecutionHistory;
use crate::agent::value_objects::ReasoningTag;

const DEFAULT_PREAMBLE: &str = r#"Role:
You are a math agent who solves problems step-by-step via reasoning. You have access to tools; you determine the steps, the tools required and the parameters for each tool.

Goal:
Understand the problem and plan the steps end to end. Your initial plan must cover:
- Problem Analysis: identify variables, constraints and potential ambiguities
- Input Validation: check all inputs for validity and completeness
- Calculation Planning: determine the mathematical approach and its edge cases
- Verification Steps: plan for validating results using alternative methods

Once you have the plan, look at the steps already executed and the current state, then determine the next step to execute. Repeat until you reach the goal, then send the final answer."#;

/// Renders the prompt sent to the model on every turn.
#[derive(Debug, Clone)]
pub struct TaskPromptTemplate {
    preamble: String,
}

impl Default for TaskPromptTemplate {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
        }
    }
}

impl TaskPromptTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the role/goal section (everything before the reasoning tags).
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Render the full prompt for one turn.
    pub fn render(&self, tools_description: &str, history: &ExecutionHistory) -> String {
        format!(
            r#"{preamble}

Reasoning tags:
For each step in your solution, tag the type of reasoning used:
{tags}

Context:
Current Execution State:
{state}

Available tools:
{tools}

{protocol}"#,
            preamble = self.preamble,
            tags = Self::reasoning_tags(),
            state = history.to_prompt_json(),
            tools = tools_description,
            protocol = Self::protocol_rules(),
        )
    }

    fn reasoning_tags() -> String {
        ReasoningTag::KNOWN
            .iter()
            .map(|tag| format!("- [{}]: {}", tag, tag.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Response format examples and rules.
    pub fn protocol_rules() -> &'static str {
        r#"You must respond with EXACTLY ONE response_type per response (no additional text):
Example Plan Response:
{
    "response_type": "plan",
    "steps": [
        {
            "step_number": 1,
            "description": "Convert INDIA to ASCII values",
            "reasoning": "Need ASCII values for mathematical computation",
            "expected_tool": "strings_to_chars_to_int"
        }
    ]
}

Example Function Call:
{
    "response_type": "function_call",
    "function": {
        "name": "strings_to_chars_to_int",
        "parameters": {
            "string": "INDIA"
        },
        "reasoning_tag": "ARITHMETIC",
        "reasoning": "Converting characters to ASCII values for calculation"
    }
}

Example Final Answer:
{
    "response_type": "final_answer",
    "result": "42",
    "summary": "Completed all calculations"
}

Important:
- Each function call must be in a separate JSON response.
- Your response should have ONLY a JSON object.
- If you don't have a plan already in the execution state, respond with a plan first.
- If you already have a plan, NEVER respond with a plan again.
- If you already have a plan, ALWAYS respond with the next step to be executed.
- Parameters are matched to the tool's parameters by position, in the order listed.
- When a function returns multiple values, you need to process all of them.
- Do not repeat function calls with the same parameters.
- Once you have executed all the steps of the plan, respond with the final answer.
- Don't add () to the function names, just use the function name as it is.

DO NOT include any explanations or additional text."#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embeds_state_and_tools() {
        let history = ExecutionHistory::new("Calculate the sum of 5 and 3.");
        let prompt = TaskPromptTemplate::new().render("1. add(a: integer, b: integer) - Add", &history);

        assert!(prompt.contains("\"user_query\": \"Calculate the sum of 5 and 3.\""));
        assert!(prompt.contains("\"execution_plan\": null"));
        assert!(prompt.contains("1. add(a: integer, b: integer) - Add"));
        assert!(prompt.contains("- [VERIFICATION]: Self-check steps"));
        assert!(prompt.contains("NEVER respond with a plan again"));
    }

    #[test]
    fn test_custom_preamble() {
        let template = TaskPromptTemplate::new().with_preamble("You are a calculator.");
        let prompt = template.render("No tools available", &ExecutionHistory::new("q"));
        assert!(prompt.starts_with("You are a calculator."));
        assert!(!prompt.contains("Role:"));
    }
}
