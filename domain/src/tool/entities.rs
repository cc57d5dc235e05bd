//! Tool entities
//!
//! A [`ToolDescriptor`] is what a tool session reports about one of its tools:
//! a name, a description shown to the model, an ordered [`ParameterSchema`]
//! and the [`SessionId`] of the session that can execute it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declared type of a tool parameter, as understood by the coercer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Integer,
    Number,
    /// Also the fallback for unknown or missing JSON-Schema types
    String,
    IntegerArray,
    Object,
}

impl ParamType {
    /// Map a JSON-Schema `type` keyword to a parameter type.
    pub fn from_schema_type(schema_type: Option<&str>) -> Self {
        match schema_type {
            Some("integer") => ParamType::Integer,
            Some("number") => ParamType::Number,
            Some("array") => ParamType::IntegerArray,
            Some("object") => ParamType::Object,
            _ => ParamType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::IntegerArray => "array-of-integer",
            ParamType::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single named parameter in a tool's schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    /// Type text exactly as the provider declared it (`None` if absent)
    pub declared_type: Option<String>,
    pub description: Option<String>,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            declared_type: Some(param_type.as_str().to_string()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Type label used in tool listings shown to the model.
    pub fn display_type(&self) -> &str {
        self.declared_type.as_deref().unwrap_or("unknown")
    }

    fn from_property(name: &str, property: &Value) -> Result<Self, String> {
        let Some(obj) = property.as_object() else {
            return Err(format!("property '{}' is not an object", name));
        };

        let declared_type = match obj.get("type") {
            Some(Value::String(t)) => Some(t.clone()),
            // ["integer", "null"] style unions: first concrete type wins
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map(str::to_string),
            _ => None,
        };

        let description = obj
            .get("description")
            .or_else(|| obj.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            param_type: ParamType::from_schema_type(declared_type.as_deref()),
            declared_type,
            description,
        })
    }
}

/// Ordered parameter schema of a tool.
///
/// A schema that cannot be understood is kept as [`ParameterSchema::Malformed`]
/// instead of being rejected, so one broken tool never hides the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterSchema {
    Declared { parameters: Vec<ToolParameter> },
    Malformed { reason: String },
}

impl ParameterSchema {
    pub fn empty() -> Self {
        ParameterSchema::Declared {
            parameters: Vec::new(),
        }
    }

    /// Convert a JSON-Schema `inputSchema` object.
    ///
    /// Parameter order follows the order of the `properties` object.
    pub fn from_json_schema(schema: &Value) -> Self {
        let Some(obj) = schema.as_object() else {
            return ParameterSchema::Malformed {
                reason: "input schema is not an object".to_string(),
            };
        };

        let properties = match obj.get("properties") {
            None | Some(Value::Null) => return ParameterSchema::empty(),
            Some(Value::Object(props)) => props,
            Some(_) => {
                return ParameterSchema::Malformed {
                    reason: "'properties' is not an object".to_string(),
                };
            }
        };

        let mut parameters = Vec::with_capacity(properties.len());
        for (name, property) in properties {
            match ToolParameter::from_property(name, property) {
                Ok(param) => parameters.push(param),
                Err(reason) => return ParameterSchema::Malformed { reason },
            }
        }

        ParameterSchema::Declared { parameters }
    }

    pub fn parameters(&self) -> Option<&[ToolParameter]> {
        match self {
            ParameterSchema::Declared { parameters } => Some(parameters),
            ParameterSchema::Malformed { .. } => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ParameterSchema::Malformed { .. })
    }
}

/// Opaque handle naming the session that executes a tool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptor of a tool offered by a session. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: ParameterSchema,
    pub session: SessionId,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, session: SessionId) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: ParameterSchema::empty(),
            session,
        }
    }

    /// Build a descriptor from an MCP-style tool listing entry.
    pub fn from_json_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: &Value,
        session: SessionId,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: ParameterSchema::from_json_schema(input_schema),
            session,
        }
    }

    /// Append a parameter (builder). Has no effect on a malformed schema.
    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        if let ParameterSchema::Declared { parameters } = &mut self.schema {
            parameters.push(param);
        }
        self
    }

    pub fn with_schema(mut self, schema: ParameterSchema) -> Self {
        self.schema = schema;
        self
    }

    /// `name(a: integer, b: integer)`, or the malformation reason.
    pub fn signature(&self) -> Result<String, &str> {
        match &self.schema {
            ParameterSchema::Malformed { reason } => Err(reason),
            ParameterSchema::Declared { parameters } if parameters.is_empty() => {
                Ok(format!("{}(no parameters)", self.name))
            }
            ParameterSchema::Declared { parameters } => {
                let params = parameters
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.display_type()))
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(format!("{}({})", self.name, params))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> SessionId {
        SessionId::new("math")
    }

    #[test]
    fn test_schema_type_mapping() {
        assert_eq!(ParamType::from_schema_type(Some("integer")), ParamType::Integer);
        assert_eq!(ParamType::from_schema_type(Some("number")), ParamType::Number);
        assert_eq!(ParamType::from_schema_type(Some("array")), ParamType::IntegerArray);
        assert_eq!(ParamType::from_schema_type(Some("object")), ParamType::Object);
        assert_eq!(ParamType::from_schema_type(Some("boolean")), ParamType::String);
        assert_eq!(ParamType::from_schema_type(None), ParamType::String);
    }

    #[test]
    fn test_schema_preserves_property_order() {
        let schema = json!({
            "type": "object",
            "properties": {
                "b": {"type": "integer"},
                "a": {"type": "string", "title": "A"}
            }
        });
        let parsed = ParameterSchema::from_json_schema(&schema);
        let params = parsed.parameters().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "b");
        assert_eq!(params[0].param_type, ParamType::Integer);
        assert_eq!(params[1].name, "a");
        assert_eq!(params[1].description.as_deref(), Some("A"));
    }

    #[test]
    fn test_schema_without_properties_is_empty() {
        let parsed = ParameterSchema::from_json_schema(&json!({"type": "object"}));
        assert_eq!(parsed.parameters().map(|p| p.len()), Some(0));
    }

    #[test]
    fn test_malformed_schemas() {
        assert!(ParameterSchema::from_json_schema(&json!("nope")).is_malformed());
        assert!(ParameterSchema::from_json_schema(&json!({"properties": []})).is_malformed());
        assert!(
            ParameterSchema::from_json_schema(&json!({"properties": {"a": 3}})).is_malformed()
        );
    }

    #[test]
    fn test_union_type_uses_first_concrete_type() {
        let schema = json!({"properties": {"n": {"type": ["null", "integer"]}}});
        let parsed = ParameterSchema::from_json_schema(&schema);
        assert_eq!(parsed.parameters().unwrap()[0].param_type, ParamType::Integer);
    }

    #[test]
    fn test_signature() {
        let tool = ToolDescriptor::new("add", "Add two numbers", session())
            .with_parameter(ToolParameter::new("a", ParamType::Integer))
            .with_parameter(ToolParameter::new("b", ParamType::Integer));
        assert_eq!(tool.signature().unwrap(), "add(a: integer, b: integer)");

        let bare = ToolDescriptor::new("open_paint", "Open canvas", session());
        assert_eq!(bare.signature().unwrap(), "open_paint(no parameters)");
    }

    #[test]
    fn test_signature_shows_declared_type_text() {
        let schema = json!({"properties": {"int_list": {"type": "array"}, "x": {}}});
        let tool = ToolDescriptor::from_json_schema("f", "", &schema, session());
        assert_eq!(tool.signature().unwrap(), "f(int_list: array, x: unknown)");
    }

    #[test]
    fn test_session_id_serializes_transparently() {
        let json = serde_json::to_string(&SessionId::new("mcp:math")).unwrap();
        assert_eq!(json, "\"mcp:math\"");
    }
}
