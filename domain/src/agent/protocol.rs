//! Response protocol parser
//!
//! Every model turn must produce exactly one JSON document, discriminated by
//! `response_type`:
//!
//! | `response_type`  | Required payload |
//! |------------------|------------------|
//! | `plan`           | `steps`: non-empty list of `{step_number, description, reasoning, expected_tool}` |
//! | `function_call`  | `function`: `{name, parameters, reasoning_tag, reasoning}` |
//! | `final_answer`   | `result`, `summary` |
//!
//! The document may be wrapped in a Markdown code fence. Unrelated extra
//! top-level keys are ignored, but a document that also populates another
//! response type's payload (e.g. `steps` next to `function`) is rejected as
//! ambiguous.

use serde_json::{Map, Value};
use thiserror::Error;

use super::value_objects::{FinalAnswer, FunctionCall, Plan, PlanStep, ReasoningTag};

/// Errors produced while parsing a model response
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Response has no 'response_type'")]
    MissingDiscriminator,

    #[error("Unknown response_type '{0}'")]
    UnknownResponseType(String),

    #[error("Ambiguous '{declared}' response also carries {}", .others.join(", "))]
    AmbiguousPayload {
        declared: String,
        others: Vec<String>,
    },

    #[error("Plan has no steps")]
    EmptyPlan,

    #[error("Missing field '{field}' in {context}")]
    MissingField { context: String, field: String },

    #[error("Field '{field}' in {context} must be {expected}")]
    InvalidField {
        context: String,
        field: String,
        expected: &'static str,
    },
}

/// One classified model response
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    Plan(Plan),
    FunctionCall(FunctionCall),
    FinalAnswer(FinalAnswer),
}

impl ModelResponse {
    pub fn response_type(&self) -> &'static str {
        match self {
            ModelResponse::Plan(_) => "plan",
            ModelResponse::FunctionCall(_) => "function_call",
            ModelResponse::FinalAnswer(_) => "final_answer",
        }
    }
}

/// Payload keys owned by each response type
const PAYLOAD_KEYS: [(&str, &[&str]); 3] = [
    ("plan", &["steps"]),
    ("function_call", &["function"]),
    ("final_answer", &["result", "summary"]),
];

/// Parse and validate one raw model response.
pub fn parse_response(raw: &str) -> Result<ModelResponse, ProtocolError> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    let Value::Object(doc) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let response_type = doc
        .get("response_type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingDiscriminator)?
        .trim()
        .to_string();

    if !PAYLOAD_KEYS.iter().any(|(ty, _)| *ty == response_type) {
        return Err(ProtocolError::UnknownResponseType(response_type));
    }
    check_single_payload(&doc, &response_type)?;

    match response_type.as_str() {
        "plan" => parse_plan(&doc).map(ModelResponse::Plan),
        "function_call" => parse_function_call(&doc).map(ModelResponse::FunctionCall),
        _ => parse_final_answer(&doc).map(ModelResponse::FinalAnswer),
    }
}

/// Remove a surrounding Markdown code fence, if any.
///
/// Handles ```` ```json ````, bare ```` ``` ```` and single-line fences.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn check_single_payload(doc: &Map<String, Value>, declared: &str) -> Result<(), ProtocolError> {
    let others: Vec<String> = PAYLOAD_KEYS
        .iter()
        .filter(|(ty, _)| *ty != declared)
        .flat_map(|(_, keys)| keys.iter())
        .filter(|key| doc.get(**key).is_some_and(|v| !v.is_null()))
        .map(|key| key.to_string())
        .collect();

    if others.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::AmbiguousPayload {
            declared: declared.to_string(),
            others,
        })
    }
}

fn parse_plan(doc: &Map<String, Value>) -> Result<Plan, ProtocolError> {
    let steps = match doc.get("steps") {
        None | Some(Value::Null) => return Err(missing("plan", "steps")),
        Some(Value::Array(steps)) => steps,
        Some(_) => return Err(invalid("plan", "steps", "a list")),
    };
    if steps.is_empty() {
        return Err(ProtocolError::EmptyPlan);
    }

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let context = format!("plan step {}", i + 1);
            let Some(step) = step.as_object() else {
                return Err(invalid(&context, "step", "an object"));
            };
            Ok(PlanStep {
                step_number: step_number(step, &context)?,
                description: required_str(step, "description", &context)?,
                reasoning: required_str(step, "reasoning", &context)?,
                expected_tool: required_str(step, "expected_tool", &context)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Plan::new)
}

fn parse_function_call(doc: &Map<String, Value>) -> Result<FunctionCall, ProtocolError> {
    let context = "function_call";
    let function = match doc.get("function") {
        None | Some(Value::Null) => return Err(missing(context, "function")),
        Some(Value::Object(f)) => f,
        Some(_) => return Err(invalid(context, "function", "an object")),
    };

    let name = required_str(function, "name", "function")?;
    if name.trim().is_empty() {
        return Err(invalid("function", "name", "a non-empty string"));
    }

    let parameters = match function.get("parameters") {
        None | Some(Value::Null) => return Err(missing("function", "parameters")),
        Some(Value::Object(params)) => params.clone(),
        Some(_) => return Err(invalid("function", "parameters", "an object")),
    };

    Ok(FunctionCall {
        name: name.trim().to_string(),
        parameters,
        reasoning_tag: ReasoningTag::parse(&required_str(function, "reasoning_tag", "function")?),
        reasoning: required_str(function, "reasoning", "function")?,
    })
}

fn parse_final_answer(doc: &Map<String, Value>) -> Result<FinalAnswer, ProtocolError> {
    let result = match doc.get("result") {
        None | Some(Value::Null) => return Err(missing("final_answer", "result")),
        Some(result) => result.clone(),
    };
    Ok(FinalAnswer {
        result,
        summary: required_str(doc, "summary", "final_answer")?,
    })
}

fn required_str(
    obj: &Map<String, Value>,
    field: &str,
    context: &str,
) -> Result<String, ProtocolError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(missing(context, field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(context, field, "a string")),
    }
}

fn step_number(step: &Map<String, Value>, context: &str) -> Result<u32, ProtocolError> {
    let parsed = match step.get("step_number") {
        None | Some(Value::Null) => return Err(missing(context, "step_number")),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        Some(_) => None,
    };
    parsed.ok_or_else(|| invalid(context, "step_number", "a non-negative integer"))
}

fn missing(context: &str, field: &str) -> ProtocolError {
    ProtocolError::MissingField {
        context: context.to_string(),
        field: field.to_string(),
    }
}

fn invalid(context: &str, field: &str, expected: &'static str) -> ProtocolError {
    ProtocolError::InvalidField {
        context: context.to_string(),
        field: field.to_string(),
        expected,
    }
}
