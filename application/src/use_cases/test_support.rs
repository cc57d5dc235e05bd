//! In-memory collaborators shared by the use case tests.

use crate::ports::model_backend::{GatewayError, ModelBackend};
use crate::ports::progress::ProgressObserver;
use crate::ports::tool_invoker::{InvokeError, ToolInvokerPort};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use stepwise_domain::{
    ExecutionHistory, ParamType, SessionId, TaskStatus, ToolCatalog, ToolDescriptor, ToolOutput,
    ToolParameter,
};

/// Model backend that replays scripted responses, then repeats a fallback
pub(crate) struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    fallback: String,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            fallback: r#"{"response_type": "plan", "steps": [{"step_number": 1, "description": "again", "reasoning": "r", "expected_tool": "add"}]}"#.to_string(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_error(self, error: GatewayError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

type Handler = Box<dyn Fn(&Map<String, Value>) -> Result<ToolOutput, InvokeError> + Send + Sync>;

/// Tool invoker backed by closures, recording every call
pub(crate) struct ScriptedInvoker {
    catalog: ToolCatalog,
    handlers: HashMap<String, Handler>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl ScriptedInvoker {
    pub(crate) fn new() -> Self {
        Self {
            catalog: ToolCatalog::new(),
            handlers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_tool(
        mut self,
        descriptor: ToolDescriptor,
        handler: impl Fn(&Map<String, Value>) -> Result<ToolOutput, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        self.handlers
            .insert(descriptor.name.clone(), Box::new(handler));
        self.catalog.register(vec![descriptor]);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// The math tools used by the ASCII and calculator scenarios
    pub(crate) fn math() -> Self {
        let session = SessionId::new("math");
        Self::new()
            .with_tool(
                ToolDescriptor::new("add", "Add two numbers", session.clone())
                    .with_parameter(ToolParameter::new("a", ParamType::Integer))
                    .with_parameter(ToolParameter::new("b", ParamType::Integer)),
                |args| {
                    let sum = args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0);
                    Ok(ToolOutput::TextItems(vec![sum.to_string()]))
                },
            )
            .with_tool(
                ToolDescriptor::new(
                    "strings_to_chars_to_int",
                    "Return the ASCII values of the characters in a word",
                    session.clone(),
                )
                .with_parameter(ToolParameter::new("string", ParamType::String)),
                |args| {
                    let text = args["string"].as_str().unwrap_or_default();
                    Ok(ToolOutput::TextItems(
                        text.chars().map(|c| (c as u32).to_string()).collect(),
                    ))
                },
            )
            .with_tool(
                ToolDescriptor::new(
                    "int_list_to_exponential_sum",
                    "Return sum of exponentials of numbers in a list",
                    session.clone(),
                )
                .with_parameter(ToolParameter::new("int_list", ParamType::IntegerArray)),
                |args| {
                    let sum: f64 = args["int_list"]
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(Value::as_i64)
                                .map(|i| (i as f64).exp())
                                .sum()
                        })
                        .unwrap_or(0.0);
                    Ok(ToolOutput::TextItems(vec![sum.to_string()]))
                },
            )
            .with_tool(
                ToolDescriptor::new("divide", "Divide two numbers", session)
                    .with_parameter(ToolParameter::new("a", ParamType::Integer))
                    .with_parameter(ToolParameter::new("b", ParamType::Integer)),
                |args| {
                    let b = args["b"].as_i64().unwrap_or(0);
                    if b == 0 {
                        return Err(InvokeError::Execution {
                            tool: "divide".to_string(),
                            message: "division by zero".to_string(),
                            output: Some(ToolOutput::Opaque("ZeroDivisionError".to_string())),
                        });
                    }
                    let a = args["a"].as_i64().unwrap_or(0);
                    Ok(ToolOutput::TextItems(vec![(a as f64 / b as f64).to_string()]))
                },
            )
    }
}

#[async_trait]
impl ToolInvokerPort for ScriptedInvoker {
    fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolOutput, InvokeError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| InvokeError::ToolNotFound(name.to_string()))?;
        handler(arguments)
    }
}

/// Observer that records every status it sees, with the step count at that moment
#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<(TaskStatus, usize, String)>>,
}

impl RecordingObserver {
    pub(crate) fn statuses(&self) -> Vec<TaskStatus> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(status, _, _)| status.clone())
            .collect()
    }

    pub(crate) fn step_counts(&self) -> Vec<usize> {
        self.events.lock().unwrap().iter().map(|(_, n, _)| *n).collect()
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, q)| q.clone())
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, status: &TaskStatus, history: &ExecutionHistory) {
        self.events.lock().unwrap().push((
            status.clone(),
            history.steps().len(),
            history.user_query().to_string(),
        ));
    }
}

pub(crate) fn plan_json() -> String {
    json!({
        "response_type": "plan",
        "steps": [
            {"step_number": 1, "description": "Convert INDIA to ASCII values", "reasoning": "Need numbers", "expected_tool": "strings_to_chars_to_int"},
            {"step_number": 2, "description": "Sum the exponentials", "reasoning": "Final value", "expected_tool": "int_list_to_exponential_sum"}
        ]
    })
    .to_string()
}

pub(crate) fn call_json(name: &str, parameters: Value, tag: &str) -> String {
    json!({
        "response_type": "function_call",
        "function": {
            "name": name,
            "parameters": parameters,
            "reasoning_tag": tag,
            "reasoning": "next step of the plan"
        }
    })
    .to_string()
}

pub(crate) fn answer_json(result: Value) -> String {
    json!({
        "response_type": "final_answer",
        "result": result,
        "summary": "done"
    })
    .to_string()
}
