//! Argument coercion
//!
//! Models send tool parameters as a JSON object, but the names they pick are
//! unreliable. Coercion therefore ignores the names and binds the values
//! **positionally**: the first raw value goes to the first schema parameter,
//! the second to the second, and so on. Each value is then converted to the
//! parameter's declared [`ParamType`].
//!
//! | Declared type      | Accepted raw values |
//! |--------------------|---------------------|
//! | `integer`          | JSON integer, integral float, `"42"` |
//! | `number`           | finite JSON number, `"2.5"` |
//! | `array-of-integer` | `"[1, 2, 3]"`, `[1, 2, 3]`, `[[1, 2, 3]]` (one level flattened) |
//! | `object`           | JSON object, string holding a JSON object |
//! | `string`           | anything (non-strings become compact JSON text) |

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::entities::{ParamType, ToolDescriptor, ToolParameter};
use crate::core::string::truncate;

const OBSERVED_PREVIEW_LEN: usize = 80;

/// Named, typed arguments in schema order
pub type CoercedArguments = Map<String, Value>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Not enough parameters for '{tool}': expected {expected}, got {provided}")]
    InsufficientParameters {
        tool: String,
        expected: usize,
        provided: usize,
    },

    #[error("Parameter '{parameter}' expects {declared}, got {observed}")]
    TypeMismatch {
        parameter: String,
        declared: ParamType,
        observed: String,
    },

    #[error("Tool '{tool}' has an unusable schema: {reason}")]
    UnusableSchema { tool: String, reason: String },
}

/// Bind raw parameter values to `tool`'s schema by position and convert them.
///
/// Values beyond the schema's length are ignored.
pub fn coerce(
    raw_parameters: &Map<String, Value>,
    tool: &ToolDescriptor,
) -> Result<CoercedArguments, CoercionError> {
    let Some(schema) = tool.schema.parameters() else {
        let reason = match tool.signature() {
            Err(reason) => reason.to_string(),
            Ok(_) => String::new(),
        };
        return Err(CoercionError::UnusableSchema {
            tool: tool.name.clone(),
            reason,
        });
    };

    if raw_parameters.len() < schema.len() {
        return Err(CoercionError::InsufficientParameters {
            tool: tool.name.clone(),
            expected: schema.len(),
            provided: raw_parameters.len(),
        });
    }

    let mut arguments = CoercedArguments::new();
    for (param, value) in schema.iter().zip(raw_parameters.values()) {
        arguments.insert(param.name.clone(), coerce_value(param, value)?);
    }
    Ok(arguments)
}

/// Convert one raw value to the parameter's declared type.
pub fn coerce_value(param: &ToolParameter, value: &Value) -> Result<Value, CoercionError> {
    let converted = match param.param_type {
        ParamType::Integer => to_integer(value).map(Value::from),
        ParamType::Number => to_number(value).and_then(Number::from_f64).map(Value::Number),
        ParamType::IntegerArray => to_integer_array(value).map(Value::from),
        ParamType::Object => to_object(value).map(Value::Object),
        ParamType::String => Some(Value::String(super::value_objects::string_form(value))),
    };

    converted.ok_or_else(|| CoercionError::TypeMismatch {
        parameter: param.name.clone(),
        declared: param.param_type,
        observed: describe_observed(value),
    })
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn to_integer_array(value: &Value) -> Option<Vec<i64>> {
    match value {
        Value::String(s) => {
            let inner = s.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
            if inner.is_empty() {
                return Some(Vec::new());
            }
            inner
                .split(',')
                .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').parse().ok())
                .collect()
        }
        Value::Array(items) => {
            let items = match items.first() {
                Some(Value::Array(nested)) => nested,
                _ => items,
            };
            items.iter().map(to_integer).collect()
        }
        _ => None,
    }
}

fn to_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

fn describe_observed(value: &Value) -> String {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("{} {}", kind, truncate(&value.to_string(), OBSERVED_PREVIEW_LEN))
}
