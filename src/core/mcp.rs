//! MCP server over stdio
//!
//! Line-delimited JSON-RPC 2.0: one request per line in, one response per
//! line out. Only stdout carries protocol traffic.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::tools::registry::ToolRegistry;
use crate::tools::ToolMetadata;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "hcp-scorecard";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MCPTool {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

impl From<&ToolMetadata> for MCPTool {
    fn from(metadata: &ToolMetadata) -> Self {
        let properties: serde_json::Map<String, Value> = metadata
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({ "type": p.param_type, "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = metadata
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        Self {
            name: metadata.name.clone(),
            description: Some(metadata.description.clone()),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MCPRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct MCPResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MCPError {
    code: i32,
    message: String,
}

impl MCPError {
    const PARSE_ERROR: i32 = -32700;
    const INVALID_REQUEST: i32 = -32600;
    const METHOD_NOT_FOUND: i32 = -32601;
    const INVALID_PARAMS: i32 = -32602;

    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl MCPResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Serves a tool registry to one MCP client
pub struct MCPServer {
    registry: ToolRegistry,
}

impl MCPServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Serve on the process's stdin/stdout until the client disconnects
    pub async fn serve_stdio(&self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }

    /// Serve until `reader` reaches end of input
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            "MCP server ready with {} tools",
            self.registry.tool_names().len()
        );

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                tracing::info!("MCP client closed the connection");
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let json = serde_json::to_string(&response)?;
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
    }

    /// Handle one raw line; `None` for notifications
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Unparseable MCP message: {}", e);
                let response =
                    MCPResponse::error(Value::Null, MCPError::new(MCPError::PARSE_ERROR, e.to_string()));
                return serde_json::to_value(response).ok();
            }
        };

        self.handle_message(message)
            .await
            .and_then(|response| serde_json::to_value(response).ok())
    }

    async fn handle_message(&self, message: Value) -> Option<MCPResponse> {
        let id = message.get("id").cloned();
        let request: MCPRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(MCPResponse::error(
                    id.unwrap_or(Value::Null),
                    MCPError::new(MCPError::INVALID_REQUEST, e.to_string()),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(MCPResponse::error(
                request.id.unwrap_or(Value::Null),
                MCPError::new(MCPError::INVALID_REQUEST, "jsonrpc must be '2.0'"),
            ));
        }

        let Some(id) = request.id else {
            tracing::debug!("Notification: {}", request.method);
            return None;
        };

        tracing::debug!("Request {}: {}", id, request.method);
        Some(match self.handle_request(&request.method, request.params).await {
            Ok(result) => MCPResponse::result(id, result),
            Err(error) => MCPResponse::error(id, error),
        })
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, MCPError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false }
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => {
                let tools: Vec<MCPTool> = self.registry.list_tools().iter().map(MCPTool::from).collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(params).await,
            _ => Err(MCPError::new(
                MCPError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, MCPError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| MCPError::new(MCPError::INVALID_PARAMS, "tools/call requires a string 'name'"))?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(Value::Object(map)) => Value::Object(map.clone()),
            Some(_) => {
                return Err(MCPError::new(
                    MCPError::INVALID_PARAMS,
                    "tools/call 'arguments' must be an object",
                ))
            }
        };

        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| MCPError::new(MCPError::INVALID_PARAMS, format!("Unknown tool: {}", name)))?;

        tracing::info!("Calling tool {}", name);
        let (text, is_error) = match tool.execute(arguments).await {
            Ok(result) if result.success => (result.output, false),
            Ok(result) => (result.error.unwrap_or_else(|| "Tool failed".to_string()), true),
            Err(e) => (format!("Invalid arguments: {}", e), true),
        };

        Ok(json!({
            "content": [{ "type": "text", "text": text }],
            "isError": is_error
        }))
    }
}
