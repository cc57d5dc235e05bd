//! JSON-RPC protocol types for MCP stdio communication.
//!
//! Messages are newline-delimited JSON-RPC 2.0 objects.
//!
//! # Protocol Overview
//!
//! - **Requests**: Client → server (`initialize`, `tools/list`, `tools/call`)
//! - **Responses**: Server → client (result or error)
//! - **Notifications**: Client → server (`notifications/initialized`);
//!   notifications from the server are logged and dropped

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

/// MCP protocol revision sent in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Global request ID counter for JSON-RPC requests.
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Generates a unique request ID.
fn next_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with an auto-generated ID.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_id(),
            method: method.into(),
            params,
        }
    }

    pub fn initialize() -> Self {
        Self::new(
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "stepwise",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
        )
    }

    pub fn list_tools(cursor: Option<&str>) -> Self {
        Self::new("tools/list", cursor.map(|c| json!({ "cursor": c })))
    }

    pub fn call_tool(name: &str, arguments: &Map<String, Value>) -> Self {
        Self::new(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
    }
}

/// JSON-RPC notification (no id, no response expected)
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn initialized() -> Self {
        Self {
            jsonrpc: "2.0",
            method: "notifications/initialized".to_string(),
            params: None,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// One entry of a `tools/list` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
}

/// `tools/list` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<ListedTool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Whether a `tools/call` result reports a tool-side failure
pub fn is_error_result(result: &Value) -> bool {
    result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Classification of an incoming line
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response(u64),
    /// A request from the server (has `id` + `method`). Unsupported; answered with an error.
    IncomingRequest(u64),
    /// A notification (has `method`, no `id`), e.g. `notifications/message`.
    Notification,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let id = json.get("id").and_then(Value::as_u64);
    let method = json.get("method").and_then(Value::as_str);

    match (id, method) {
        (Some(id), Some(_)) => MessageKind::IncomingRequest(id),
        (Some(id), None) => MessageKind::Response(id),
        _ => MessageKind::Notification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = JsonRpcRequest::new("tools/list", None);
        let b = JsonRpcRequest::new("tools/list", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_call_tool_keeps_argument_order() {
        let mut args = Map::new();
        args.insert("b".to_string(), json!(3));
        args.insert("a".to_string(), json!(5));
        let request = JsonRpcRequest::call_tool("subtract", &args);
        let text = serde_json::to_string(&request).unwrap();
        assert!(text.contains(r#""arguments":{"b":3,"a":5}"#));
        assert!(text.contains(r#""method":"tools/call""#));
    }

    #[test]
    fn test_list_tools_result_parse() {
        let result: ListToolsResult = serde_json::from_value(json!({
            "tools": [
                {"name": "add", "description": "Add two numbers", "inputSchema": {"type": "object", "properties": {"a": {"type": "integer"}}}},
                {"name": "ping"}
            ]
        }))
        .unwrap();
        assert_eq!(result.tools.len(), 2);
        assert_eq!(result.tools[0].input_schema["properties"]["a"]["type"], "integer");
        assert!(result.tools[1].description.is_none());
        assert!(result.tools[1].input_schema.is_null());
        assert!(result.next_cursor.is_none());
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify_message(&json!({"id": 4, "result": {}})),
            MessageKind::Response(4)
        );
        assert_eq!(
            classify_message(&json!({"id": 1, "method": "roots/list"})),
            MessageKind::IncomingRequest(1)
        );
        assert_eq!(
            classify_message(&json!({"method": "notifications/message", "params": {}})),
            MessageKind::Notification
        );
    }

    #[test]
    fn test_is_error_result() {
        assert!(is_error_result(&json!({"isError": true, "content": []})));
        assert!(!is_error_result(&json!({"content": []})));
    }
}
