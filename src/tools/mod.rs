//! Tool System - the operations an agent can call
//!
//! Information Hiding:
//! - Metric computation and gateway access hidden behind trait
//! - Argument parsing and defaults hidden in implementations
//! - Registry implementation details hidden from the MCP server

pub mod macros;
pub mod metrics;
pub mod records;
pub mod registry;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Tool parameter schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: String,
    pub description: String,
    pub required: bool,
}

/// Tool metadata - describes what the tool does and how to use it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl fmt::Display for ToolMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Pretty-printed JSON of any serializable value
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::success(serde_json::to_string_pretty(value)?))
    }
}

/// Tool trait - All tools must implement this
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool metadata (name, description, parameters)
    fn metadata(&self) -> ToolMetadata;

    /// Execute the tool with given arguments
    ///
    /// # Arguments
    /// * `args` - JSON object containing tool arguments
    ///
    /// # Returns
    /// * `ToolResult` - Success with JSON output, or failure carrying the
    ///   gateway error. Invalid arguments are returned as `Err`.
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    /// Validate arguments before execution (optional)
    fn validate(&self, _args: &Value) -> Result<()> {
        Ok(())
    }
}

/// Non-negative integer argument with a default and an upper bound
pub(crate) fn count_arg(args: &Value, name: &str, default: u32, max: u32) -> Result<u32> {
    let value = match args.get(name) {
        None | Some(Value::Null) => return Ok(default),
        Some(value) => value,
    };

    let n = value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
        .ok_or_else(|| {
            anyhow::anyhow!("'{}' must be a non-negative integer, got {}", name, value)
        })?;

    if n > u64::from(max) {
        return Err(anyhow::anyhow!("'{}' must be at most {}, got {}", name, max, n));
    }

    Ok(n as u32)
}
