//! Tool value objects
//!
//! Tool sessions return heterogeneous result envelopes. [`ToolOutput`] is the
//! single canonical shape every result is normalised into at the invoker
//! boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutput {
    /// Text extracted from each content item, in order
    TextItems(Vec<String>),
    /// String form of a result without a content list
    Opaque(String),
}

impl ToolOutput {
    /// Normalise a raw session result.
    ///
    /// A result exposing a `content` list yields one string per item: the
    /// item's `text` field, or the item's own string form when it has none.
    /// Any other result yields its string form as a single element.
    pub fn from_raw(raw: &Value) -> Self {
        if let Some(items) = raw.get("content").and_then(Value::as_array) {
            let texts = items
                .iter()
                .map(|item| match item.get("text").and_then(Value::as_str) {
                    Some(text) => text.to_string(),
                    None => string_form(item),
                })
                .collect();
            return ToolOutput::TextItems(texts);
        }
        ToolOutput::Opaque(string_form(raw))
    }

    pub fn texts(&self) -> Vec<&str> {
        match self {
            ToolOutput::TextItems(items) => items.iter().map(String::as_str).collect(),
            ToolOutput::Opaque(text) => vec![text.as_str()],
        }
    }

    /// Single-line rendering for displays and error messages.
    pub fn summary(&self) -> String {
        match self {
            ToolOutput::TextItems(items) if items.len() == 1 => items[0].clone(),
            ToolOutput::TextItems(items) => format!("[{}]", items.join(", ")),
            ToolOutput::Opaque(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ToolOutput::TextItems(items) => items.is_empty(),
            ToolOutput::Opaque(text) => text.is_empty(),
        }
    }
}

/// String form of a JSON value: strings as-is, everything else as compact JSON.
pub fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
