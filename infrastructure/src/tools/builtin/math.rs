//! Built-in math tool session
//!
//! In-process arithmetic tools, so tasks can run without spawning an MCP
//! server. Results use the MCP `tools/call` shape: one text content item
//! per returned value, list results split into one item per element.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use stepwise_domain::{ProviderError, SessionId, ToolDescriptor, ToolSession};

/// Session id of the built-in math tools
pub const MATH_SESSION_ID: &str = "builtin-math";

/// (name, description, [(parameter, JSON-Schema type)])
const TOOLS: &[(&str, &str, &[(&str, &str)])] = &[
    ("add", "Add two numbers", &[("a", "integer"), ("b", "integer")]),
    ("add_list", "Add all numbers in a list", &[("l", "array")]),
    ("subtract", "Subtract two numbers", &[("a", "integer"), ("b", "integer")]),
    ("multiply", "Multiply two numbers", &[("a", "integer"), ("b", "integer")]),
    ("divide", "Divide two numbers", &[("a", "integer"), ("b", "integer")]),
    ("power", "Power of two numbers", &[("a", "integer"), ("b", "integer")]),
    ("sqrt", "Square root of a number", &[("a", "integer")]),
    ("cbrt", "Cube root of a number", &[("a", "integer")]),
    ("factorial", "factorial of a number", &[("a", "integer")]),
    ("log", "log of a number", &[("a", "integer")]),
    ("remainder", "remainder of two numbers divison", &[("a", "integer"), ("b", "integer")]),
    ("sin", "sin of a number", &[("a", "integer")]),
    ("cos", "cos of a number", &[("a", "integer")]),
    ("tan", "tan of a number", &[("a", "integer")]),
    ("mine", "special mining tool", &[("a", "integer"), ("b", "integer")]),
    (
        "strings_to_chars_to_int",
        "Return the ASCII values of the characters in a word",
        &[("string", "string")],
    ),
    (
        "int_list_to_exponential_sum",
        "Return sum of exponentials of numbers in a list",
        &[("int_list", "array")],
    ),
    ("fibonacci_numbers", "Return the first n Fibonacci Numbers", &[("n", "integer")]),
];

/// A computed tool value
enum MathValue {
    Int(i64),
    Float(f64),
    List(Vec<String>),
}

/// In-process tool session providing the math tools
#[derive(Debug, Clone)]
pub struct MathSession {
    id: SessionId,
}

impl MathSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(MATH_SESSION_ID),
        }
    }

    fn input_schema(params: &[(&str, &str)]) -> Value {
        let mut properties = Map::new();
        for (name, schema_type) in params {
            let mut property = json!({ "type": schema_type });
            if *schema_type == "array" {
                property["items"] = json!({});
            }
            properties.insert((*name).to_string(), property);
        }
        let required: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    fn compute(name: &str, args: &Map<String, Value>) -> Result<MathValue, String> {
        use MathValue::{Float, Int, List};

        let value = match name {
            "add" => Int(checked(int(args, "a")?.checked_add(int(args, "b")?))?),
            "add_list" => Int(int_list(args, "l")?
                .into_iter()
                .try_fold(0i64, |acc, x| acc.checked_add(x))
                .ok_or_else(too_large)?),
            "subtract" => Int(checked(int(args, "a")?.checked_sub(int(args, "b")?))?),
            "multiply" => Int(checked(int(args, "a")?.checked_mul(int(args, "b")?))?),
            "divide" => {
                let b = int(args, "b")?;
                if b == 0 {
                    return Err("division by zero".to_string());
                }
                Float(int(args, "a")? as f64 / b as f64)
            }
            "power" => {
                let (a, b) = (int(args, "a")?, int(args, "b")?);
                match u32::try_from(b) {
                    Ok(exp) => Int(checked(a.checked_pow(exp))?),
                    Err(_) if a == 0 => return Err("0 cannot be raised to a negative power".to_string()),
                    // Negative exponents truncate toward zero like an int cast.
                    Err(_) => Int((a as f64).powf(b as f64).trunc() as i64),
                }
            }
            "sqrt" => {
                let a = int(args, "a")?;
                if a < 0 {
                    return Err("math domain error".to_string());
                }
                Float((a as f64).sqrt())
            }
            "cbrt" => Float((int(args, "a")? as f64).cbrt()),
            "factorial" => {
                let a = int(args, "a")?;
                if a < 0 {
                    return Err("factorial() not defined for negative values".to_string());
                }
                Int((1..=a)
                    .try_fold(1i64, |acc, x| acc.checked_mul(x))
                    .ok_or_else(too_large)?)
            }
            "log" => {
                let a = int(args, "a")?;
                if a <= 0 {
                    return Err("math domain error".to_string());
                }
                Float((a as f64).ln())
            }
            "remainder" => {
                let (a, b) = (int(args, "a")?, int(args, "b")?);
                if b == 0 {
                    return Err("integer modulo by zero".to_string());
                }
                let r = checked(a.checked_rem(b))?;
                // Result takes the sign of the divisor.
                Int(if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
            }
            "sin" => Float((int(args, "a")? as f64).sin()),
            "cos" => Float((int(args, "a")? as f64).cos()),
            "tan" => Float((int(args, "a")? as f64).tan()),
            "mine" => {
                let (a, b) = (int(args, "a")?, int(args, "b")?);
                Int(checked(a.checked_sub(b).and_then(|d| d.checked_sub(b)))?)
            }
            "strings_to_chars_to_int" => {
                let text = args
                    .get("string")
                    .ok_or_else(|| missing("string"))?;
                let text = match text {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                List(text.chars().map(|c| (c as u32).to_string()).collect())
            }
            "int_list_to_exponential_sum" => Float(
                int_list(args, "int_list")?
                    .into_iter()
                    .map(|x| (x as f64).exp())
                    .sum(),
            ),
            "fibonacci_numbers" => {
                let n = int(args, "n")?;
                let mut sequence: Vec<u64> = Vec::new();
                let (mut a, mut b) = (0u64, 1u64);
                for _ in 0..n.max(0) {
                    sequence.push(a);
                    let next = a.checked_add(b).ok_or_else(too_large)?;
                    a = b;
                    b = next;
                }
                List(sequence.iter().map(u64::to_string).collect())
            }
            other => return Err(format!("Unknown tool: {}", other)),
        };
        Ok(value)
    }
}

impl Default for MathSession {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(param: &str) -> String {
    format!("missing argument '{}'", param)
}

fn too_large() -> String {
    "result too large".to_string()
}

fn checked(value: Option<i64>) -> Result<i64, String> {
    value.ok_or_else(too_large)
}

fn as_int(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

fn int(args: &Map<String, Value>, param: &str) -> Result<i64, String> {
    let value = args.get(param).ok_or_else(|| missing(param))?;
    as_int(value).ok_or_else(|| format!("argument '{}' must be an integer, got {}", param, value))
}

fn int_list(args: &Map<String, Value>, param: &str) -> Result<Vec<i64>, String> {
    let value = args.get(param).ok_or_else(|| missing(param))?;
    let items = value
        .as_array()
        .ok_or_else(|| format!("argument '{}' must be a list, got {}", param, value))?;
    items
        .iter()
        .map(|item| {
            as_int(item).ok_or_else(|| format!("list '{}' holds a non-integer: {}", param, item))
        })
        .collect()
}

/// Float text: integral values keep one decimal (`4.0`), large and tiny
/// magnitudes use exponent form (`1e+20`).
fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let text = format!("{:e}", value);
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        }
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn text_envelope(items: Vec<String>, is_error: bool) -> Value {
    let content: Vec<Value> = items
        .into_iter()
        .map(|text| json!({ "type": "text", "text": text }))
        .collect();
    json!({ "content": content, "isError": is_error })
}

#[async_trait]
impl ToolSession for MathSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn display_name(&self) -> &str {
        "built-in math"
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(TOOLS
            .iter()
            .map(|(name, description, params)| {
                ToolDescriptor::from_json_schema(
                    *name,
                    *description,
                    &Self::input_schema(params),
                    self.id.clone(),
                )
            })
            .collect())
    }

    async fn execute(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProviderError> {
        if !TOOLS.iter().any(|(tool, _, _)| *tool == name) {
            return Err(ProviderError::ToolNotFound(name.to_string()));
        }
        match Self::compute(name, arguments) {
            Ok(MathValue::Int(i)) => Ok(text_envelope(vec![i.to_string()], false)),
            Ok(MathValue::Float(f)) => Ok(text_envelope(vec![format_float(f)], false)),
            Ok(MathValue::List(items)) => Ok(text_envelope(items, false)),
            Err(message) => {
                let text = format!("Error executing tool {}: {}", name, message);
                Err(ProviderError::ExecutionFailed {
                    message,
                    raw: Some(text_envelope(vec![text], true)),
                })
            }
        }
    }
}
