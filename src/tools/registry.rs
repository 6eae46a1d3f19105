//! Tool Registry
//!
//! Information Hiding:
//! - Tool storage and lookup implementation hidden
//! - Registration order preserved for stable listings

use super::metrics::{
    CloseRateTool, PipelineValueTool, ScheduledJobsTool, ScorecardTool, WeeklyRevenueTool,
};
use super::records::record_tools;
use super::{Tool, ToolMetadata};
use crate::metrics::MetricsService;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a new tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name;
        tracing::info!("Registering tool: {}", name);
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Get all tool metadata in registration order
    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.metadata())
            .collect()
    }

    /// Human readable listing of every tool and its parameters
    pub fn tools_description(&self) -> String {
        let mut descriptions = Vec::new();
        for metadata in self.list_tools() {
            let params = if metadata.parameters.is_empty() {
                "  (none)".to_string()
            } else {
                metadata
                    .parameters
                    .iter()
                    .map(|p| {
                        let required = if p.required { "required" } else { "optional" };
                        format!("  - {} ({}): {} [{}]", p.name, p.param_type, p.description, required)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            descriptions.push(format!(
                "Tool: {}\nDescription: {}\nParameters:\n{}",
                metadata.name, metadata.description, params
            ));
        }
        descriptions.join("\n\n")
    }

    /// The five scorecard metric tools
    pub fn with_metrics(service: Arc<MetricsService>) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(WeeklyRevenueTool::new(service.clone())));
        registry.register(Arc::new(PipelineValueTool::new(service.clone())));
        registry.register(Arc::new(CloseRateTool::new(service.clone())));
        registry.register(Arc::new(ScheduledJobsTool::new(service.clone())));
        registry.register(Arc::new(ScorecardTool::new(service)));

        registry
    }

    /// Metric tools plus raw record lookups over the same gateway
    pub fn with_defaults(service: Arc<MetricsService>) -> Self {
        let gateway = service.gateway();
        let mut registry = Self::with_metrics(service);

        for tool in record_tools(gateway) {
            registry.register(tool);
        }

        registry
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::stub::StubGateway;
    use crate::metrics::SystemClock;

    fn service() -> Arc<MetricsService> {
        Arc::new(MetricsService::new(Arc::new(StubGateway::new()), Arc::new(SystemClock)))
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PipelineValueTool::new(service())));

        assert!(registry.has_tool("get_pipeline_value"));
        assert!(registry.get("get_pipeline_value").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_registering_twice_keeps_one_entry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PipelineValueTool::new(service())));
        registry.register(Arc::new(PipelineValueTool::new(service())));

        assert_eq!(registry.tool_names(), vec!["get_pipeline_value"]);
    }

    #[test]
    fn test_metric_tools_in_order() {
        let registry = ToolRegistry::with_metrics(service());

        assert_eq!(
            registry.tool_names(),
            vec![
                "get_weekly_revenue",
                "get_pipeline_value",
                "get_close_rate",
                "get_scheduled_jobs",
                "get_scorecard_metrics",
            ]
        );
    }

    #[test]
    fn test_defaults_include_record_tools() {
        let registry = ToolRegistry::with_defaults(service());

        assert_eq!(registry.list_tools().len(), 14);
        assert!(registry.has_tool("get_jobs"));
        assert!(registry.has_tool("get_customer"));
    }

    #[test]
    fn test_tools_description() {
        let registry = ToolRegistry::with_metrics(service());
        let description = registry.tools_description();

        assert!(description.contains("get_close_rate"));
        assert!(description.contains("days_back (integer)"));
        assert!(description.contains("Description:"));
        assert!(description.contains("(none)"));
    }
}
