//! Value objects carried by model responses and the execution history.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of reasoning the model declares for a function call.
///
/// The seven named tags are the fixed vocabulary taught in the prompt.
/// Anything else is kept as [`ReasoningTag::Unknown`] so the call can still
/// proceed while the deviation is flagged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReasoningTag {
    Arithmetic,
    Algebra,
    Geometry,
    Logic,
    Verification,
    Uncertainty,
    Error,
    Unknown(String),
}

impl ReasoningTag {
    pub const KNOWN: [ReasoningTag; 7] = [
        ReasoningTag::Arithmetic,
        ReasoningTag::Algebra,
        ReasoningTag::Geometry,
        ReasoningTag::Logic,
        ReasoningTag::Verification,
        ReasoningTag::Uncertainty,
        ReasoningTag::Error,
    ];

    /// Parse a tag, case-insensitively, tolerating `[BRACKETS]`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let bare = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(trimmed)
            .trim();
        match bare.to_ascii_uppercase().as_str() {
            "ARITHMETIC" => ReasoningTag::Arithmetic,
            "ALGEBRA" => ReasoningTag::Algebra,
            "GEOMETRY" => ReasoningTag::Geometry,
            "LOGIC" => ReasoningTag::Logic,
            "VERIFICATION" => ReasoningTag::Verification,
            "UNCERTAINTY" => ReasoningTag::Uncertainty,
            "ERROR" => ReasoningTag::Error,
            _ => ReasoningTag::Unknown(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReasoningTag::Arithmetic => "ARITHMETIC",
            ReasoningTag::Algebra => "ALGEBRA",
            ReasoningTag::Geometry => "GEOMETRY",
            ReasoningTag::Logic => "LOGIC",
            ReasoningTag::Verification => "VERIFICATION",
            ReasoningTag::Uncertainty => "UNCERTAINTY",
            ReasoningTag::Error => "ERROR",
            ReasoningTag::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ReasoningTag::Unknown(_))
    }

    /// Prompt help text for a known tag.
    pub fn description(&self) -> &'static str {
        match self {
            ReasoningTag::Arithmetic => "Basic mathematical operations",
            ReasoningTag::Algebra => "Equation solving",
            ReasoningTag::Geometry => "Spatial reasoning",
            ReasoningTag::Logic => "Deductive reasoning",
            ReasoningTag::Verification => "Self-check steps",
            ReasoningTag::Uncertainty => {
                "When facing ambiguity or multiple possible interpretations"
            }
            ReasoningTag::Error => "When handling errors or invalid inputs",
            ReasoningTag::Unknown(_) => "Unrecognised reasoning tag",
        }
    }
}

impl fmt::Display for ReasoningTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReasoningTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReasoningTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ReasoningTag::parse(&raw))
    }
}

/// One step of the model's declared plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_number: u32,
    pub description: String,
    pub reasoning: String,
    pub expected_tool: String,
}

/// Ordered list of steps the model intends to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A single tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Parameter mapping as the model wrote it; order is significant
    pub parameters: Map<String, Value>,
    pub reasoning_tag: ReasoningTag,
    pub reasoning: String,
}

/// Terminal answer of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub result: Value,
    pub summary: String,
}

impl FinalAnswer {
    pub fn new(result: impl Into<Value>, summary: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            summary: summary.into(),
        }
    }

    /// Numeric view of the result (numbers and numeric strings).
    pub fn result_as_f64(&self) -> Option<f64> {
        match &self.result {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Display form of the result.
    pub fn result_text(&self) -> String {
        crate::tool::value_objects::string_form(&self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reasoning_tag_parse() {
        assert_eq!(ReasoningTag::parse("ARITHMETIC"), ReasoningTag::Arithmetic);
        assert_eq!(ReasoningTag::parse("verification"), ReasoningTag::Verification);
        assert_eq!(ReasoningTag::parse("[LOGIC]"), ReasoningTag::Logic);
        assert_eq!(
            ReasoningTag::parse("GUESSWORK"),
            ReasoningTag::Unknown("GUESSWORK".to_string())
        );
    }

    #[test]
    fn test_reasoning_tag_known() {
        assert!(ReasoningTag::KNOWN.iter().all(ReasoningTag::is_known));
        assert!(!ReasoningTag::parse("x").is_known());
    }

    #[test]
    fn test_reasoning_tag_serde_roundtrip_keeps_unknown_text() {
        let json = serde_json::to_string(&ReasoningTag::Unknown("Hunch".into())).unwrap();
        assert_eq!(json, "\"Hunch\"");
        let tag: ReasoningTag = serde_json::from_str("\"algebra\"").unwrap();
        assert_eq!(tag, ReasoningTag::Algebra);
    }

    #[test]
    fn test_final_answer_numeric_view() {
        assert_eq!(FinalAnswer::new(json!("42"), "s").result_as_f64(), Some(42.0));
        assert_eq!(FinalAnswer::new(json!(8), "s").result_as_f64(), Some(8.0));
        assert_eq!(FinalAnswer::new(json!({"a": 1}), "s").result_as_f64(), None);
        assert_eq!(FinalAnswer::new(json!("42"), "s").result_text(), "42");
    }
}
