//! MCP tool session over stdio.
//!
//! Spawns the configured server command and speaks newline-delimited
//! JSON-RPC 2.0 over its stdin/stdout. A single background reader task owns
//! stdout and correlates responses to requests through `oneshot` channels
//! keyed by request id, so several calls can be in flight on one session.

use super::error::{McpError, Result};
use super::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListToolsResult, MessageKind,
    classify_message, is_error_result,
};
use crate::config::FileMcpServerConfig;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use stepwise_domain::{ProviderError, SessionId, ToolDescriptor, ToolOutput, ToolSession};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Timeout for the `initialize` handshake.
const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(30);

/// Request-response correlation; `None` once the reader has stopped.
type PendingMap = Arc<RwLock<Option<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>>;
type SharedWriter = Arc<Mutex<BufWriter<ChildStdin>>>;

/// A connected MCP server
pub struct McpSession {
    id: SessionId,
    name: String,
    writer: SharedWriter,
    pending: PendingMap,
    _reader_handle: JoinHandle<()>,
    /// Server process (killed on Drop to prevent orphans).
    child: Child,
}

impl McpSession {
    /// Spawn the server and complete the `initialize` handshake.
    pub async fn connect(config: &FileMcpServerConfig) -> Result<Self> {
        let program = which::which(&config.command)
            .map_err(|_| McpError::CommandNotFound(config.command.clone()))?;
        debug!(
            "Spawning MCP server '{}': {} {}",
            config.name,
            program.display(),
            config.args.join(" ")
        );

        let mut cmd = Command::new(&program);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdin"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdout"))
        })?;
        if let Some(stderr) = child.stderr.take() {
            let server = config.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[{}] {}", server, line);
                }
            });
        }

        let writer: SharedWriter = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending: PendingMap = Arc::new(RwLock::new(Some(HashMap::new())));

        let reader_handle = tokio::spawn(Self::reader_loop(
            config.name.clone(),
            stdout,
            Arc::clone(&pending),
            Arc::clone(&writer),
        ));

        let session = Self {
            id: SessionId::new(config.name.clone()),
            name: config.name.clone(),
            writer,
            pending,
            _reader_handle: reader_handle,
            child,
        };
        session.initialize().await?;
        Ok(session)
    }

    async fn initialize(&self) -> Result<()> {
        let request = JsonRpcRequest::initialize();
        let result = tokio::time::timeout(INITIALIZE_TIMEOUT, self.request(&request))
            .await
            .map_err(|_| McpError::Timeout(format!("'{}' did not answer initialize", self.name)))??;

        let server = result
            .get("serverInfo")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!("MCP server '{}' initialized ({})", self.name, server);

        Self::write_line(&self.writer, &JsonRpcNotification::initialized()).await
    }

    /// Background reader loop, the single owner of the server's stdout.
    ///
    /// Responses are delivered to their pending `oneshot`. Server requests
    /// are answered with "method not found". When the loop exits the pending
    /// map is closed and every waiting request sees [`McpError::TransportClosed`].
    async fn reader_loop(
        server: String,
        stdout: ChildStdout,
        pending: PendingMap,
        writer: SharedWriter,
    ) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("MCP server '{}' closed stdout", server);
                    break;
                }
                Err(e) => {
                    warn!("MCP server '{}': read error: {}", server, e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            trace!("[{}] received: {}", server, line);

            let json_value: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    warn!("MCP server '{}': failed to parse JSON: {}: {}", server, e, line);
                    continue;
                }
            };

            match classify_message(&json_value) {
                MessageKind::Response(id) => {
                    let response: JsonRpcResponse = match serde_json::from_value(json_value) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("MCP server '{}': failed to parse response: {}", server, e);
                            continue;
                        }
                    };
                    let sender = pending
                        .write()
                        .await
                        .as_mut()
                        .and_then(|map| map.remove(&id));
                    if let Some(tx) = sender {
                        let _ = tx.send(response);
                    } else {
                        debug!("MCP server '{}': no pending request for id={}", server, id);
                    }
                }
                MessageKind::IncomingRequest(id) => {
                    let reply = json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32601, "message": "Method not found"},
                    });
                    if let Err(e) = Self::write_line(&writer, &reply).await {
                        warn!("MCP server '{}': failed to answer request: {}", server, e);
                    }
                }
                MessageKind::Notification => {
                    trace!("MCP server '{}': notification ignored", server);
                }
            }
        }

        *pending.write().await = None;
    }

    async fn write_line<T: Serialize>(writer: &SharedWriter, message: &T) -> Result<()> {
        let mut text = serde_json::to_string(message)?;
        trace!("MCP sending: {}", text);
        text.push('\n');

        let mut writer = writer.lock().await;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Send a request and wait for its correlated result.
    async fn request(&self, request: &JsonRpcRequest) -> Result<Value> {
        let (tx, rx) = oneshot::channel();
        match self.pending.write().await.as_mut() {
            Some(map) => map.insert(request.id, tx),
            None => return Err(McpError::TransportClosed),
        };

        if let Err(e) = Self::write_line(&self.writer, request).await {
            // Drop the pending entry
            if let Some(map) = self.pending.write().await.as_mut() {
                map.remove(&request.id);
            }
            return Err(e);
        }

        let response = rx.await.map_err(|_| McpError::TransportClosed)?;
        if let Some(error) = response.error {
            return Err(McpError::RpcError {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn list_all(&self) -> Result<Vec<ToolDescriptor>> {
        let mut descriptors = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let result = self
                .request(&JsonRpcRequest::list_tools(cursor.as_deref()))
                .await?;
            let page: ListToolsResult = serde_json::from_value(result)?;
            for tool in page.tools {
                let schema = if tool.input_schema.is_null() {
                    json!({"type": "object"})
                } else {
                    tool.input_schema
                };
                descriptors.push(ToolDescriptor::from_json_schema(
                    tool.name,
                    tool.description.unwrap_or_default(),
                    &schema,
                    self.id.clone(),
                ));
            }
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(descriptors)
    }
}

#[async_trait]
impl ToolSession for McpSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ProviderError> {
        self.list_all()
            .await
            .map_err(|e| ProviderError::DiscoveryFailed(format!("{}: {}", self.name, e)))
    }

    async fn execute(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> std::result::Result<Value, ProviderError> {
        let result = self
            .request(&JsonRpcRequest::call_tool(name, arguments))
            .await?;
        if is_error_result(&result) {
            return Err(ProviderError::ExecutionFailed {
                message: ToolOutput::from_raw(&result).summary(),
                raw: Some(result),
            });
        }
        Ok(result)
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        debug!("McpSession '{}' dropping, killing server process", self.name);
        let _ = self.child.start_kill();
    }
}
