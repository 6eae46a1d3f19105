//! Metric Tools
//!
//! One tool per public scorecard operation. Gateway failures are reported as
//! failed results; bad arguments are errors.

use super::{count_arg, Tool, ToolMetadata, ToolResult};
use crate::metrics::{MetricsError, MetricsService};
use crate::tool_metadata;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const MAX_WEEKS_BACK: u32 = 520;
pub const MAX_DAYS: u32 = 3650;

fn report<T: Serialize>(tool: &str, outcome: Result<T, MetricsError>) -> Result<ToolResult> {
    match outcome {
        Ok(metric) => ToolResult::json(&metric),
        Err(e) => {
            tracing::error!("{} failed: {}", tool, e);
            Ok(ToolResult::failure(e.to_string()))
        }
    }
}

/// Revenue from completed jobs in one calendar week
pub struct WeeklyRevenueTool {
    service: Arc<MetricsService>,
}

impl WeeklyRevenueTool {
    pub fn new(service: Arc<MetricsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for WeeklyRevenueTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "get_weekly_revenue",
            description: "Get revenue from completed jobs for a Monday-to-Sunday week: total revenue, job count and job details.",
            parameters: [
                {
                    name: "weeks_back",
                    type: "integer",
                    description: "Number of weeks back (0 = current week, 1 = last week, default 1)",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        count_arg(args, "weeks_back", 1, MAX_WEEKS_BACK).map(|_| ())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        self.validate(&args)?;

        let weeks_back = count_arg(&args, "weeks_back", 1, MAX_WEEKS_BACK)?;
        report("get_weekly_revenue", self.service.weekly_revenue(weeks_back).await)
    }
}

/// Sales pipeline: all pending estimates
pub struct PipelineValueTool {
    service: Arc<MetricsService>,
}

impl PipelineValueTool {
    pub fn new(service: Arc<MetricsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for PipelineValueTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "get_pipeline_value",
            description: "Get the current sales pipeline (all pending estimates): total value, estimate count and estimate details.",
            parameters: []
        }
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        report("get_pipeline_value", self.service.pipeline_value().await)
    }
}

/// Won / decided estimates over a trailing period
pub struct CloseRateTool {
    service: Arc<MetricsService>,
}

impl CloseRateTool {
    pub fn new(service: Arc<MetricsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for CloseRateTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "get_close_rate",
            description: "Calculate close rate (won estimates / decided estimates) for a trailing period, with won and lost counts and values.",
            parameters: [
                {
                    name: "days_back",
                    type: "integer",
                    description: "Number of days to look back (default 30)",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        count_arg(args, "days_back", 30, MAX_DAYS).map(|_| ())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        self.validate(&args)?;

        let days_back = count_arg(&args, "days_back", 30, MAX_DAYS)?;
        report("get_close_rate", self.service.close_rate(days_back).await)
    }
}

/// Jobs scheduled over the coming days
pub struct ScheduledJobsTool {
    service: Arc<MetricsService>,
}

impl ScheduledJobsTool {
    pub fn new(service: Arc<MetricsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ScheduledJobsTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "get_scheduled_jobs",
            description: "Get jobs scheduled for the upcoming period with total value and details.",
            parameters: [
                {
                    name: "days_forward",
                    type: "integer",
                    description: "Number of days to look ahead (default 14)",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        count_arg(args, "days_forward", 14, MAX_DAYS).map(|_| ())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        self.validate(&args)?;

        let days_forward = count_arg(&args, "days_forward", 14, MAX_DAYS)?;
        report("get_scheduled_jobs", self.service.scheduled_jobs(days_forward).await)
    }
}

/// Every scorecard metric in one call
pub struct ScorecardTool {
    service: Arc<MetricsService>,
}

impl ScorecardTool {
    pub fn new(service: Arc<MetricsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ScorecardTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "get_scorecard_metrics",
            description: "Get all weekly scorecard metrics in one call: this and last week's completed revenue, pipeline value, 30-day close rate and jobs scheduled in the next 14 days.",
            parameters: []
        }
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        report("get_scorecard_metrics", self.service.build_scorecard().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::stub::StubGateway;
    use crate::metrics::FixedClock;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn service(gateway: StubGateway) -> Arc<MetricsService> {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 13, 12, 0, 0)
            .unwrap();
        Arc::new(MetricsService::new(Arc::new(gateway), Arc::new(FixedClock(now))))
    }

    #[tokio::test]
    async fn test_weekly_revenue_tool_output() {
        let tool = WeeklyRevenueTool::new(service(StubGateway::new().with_records(
            "jobs",
            "complete",
            json!([{"id": "job_1", "total_amount": 300}]),
        )));

        let result = tool.execute(json!({"weeks_back": 0})).await.unwrap();
        assert!(result.success);

        let output: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(output["total_revenue"], json!(300.0));
        assert_eq!(output["job_count"], 1);
        assert_eq!(output["jobs"][0]["id"], "job_1");
        assert_eq!(output["week_start"], "2024-03-11");
        assert_eq!(output["week_end"], "2024-03-17");
        assert_eq!(output["window"]["start"], "2024-03-11T00:00:00");
        assert_eq!(output["truncated"], false);
    }

    #[tokio::test]
    async fn test_close_rate_tool_defaults_to_thirty_days() {
        let tool = CloseRateTool::new(service(StubGateway::new()));

        let result = tool.execute(json!({})).await.unwrap();
        let output: Value = serde_json::from_str(&result.output).unwrap();

        assert_eq!(output["period_days"], 30);
        assert_eq!(output["close_rate_percent"], json!(0.0));
        assert_eq!(output["since"], "2024-02-12T12:00:00");
    }

    #[tokio::test]
    async fn test_invalid_argument_is_an_error() {
        let tool = ScheduledJobsTool::new(service(StubGateway::new()));

        assert!(tool.validate(&json!({"days_forward": -3})).is_err());
        assert!(tool.execute(json!({"days_forward": "soon"})).await.is_err());
        assert!(tool.validate(&json!({"days_forward": 7})).is_ok());
    }

    #[tokio::test]
    async fn test_rejected_arguments_never_reach_the_gateway() {
        let gateway = Arc::new(StubGateway::new());
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 13, 12, 0, 0)
            .unwrap();
        let service = Arc::new(MetricsService::new(gateway.clone(), Arc::new(FixedClock(now))));

        let revenue = WeeklyRevenueTool::new(service.clone());
        let err = revenue.execute(json!({"weeks_back": 521})).await.unwrap_err();
        assert!(err.to_string().contains("at most 520"));

        let close_rate = CloseRateTool::new(service);
        assert!(close_rate.execute(json!({"days_back": 1.5})).await.is_err());

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_a_failed_result() {
        let tool = PipelineValueTool::new(service(StubGateway::new().with_failure("estimates", "pending", 401)));

        let result = tool.execute(json!({})).await.unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("HTTP 401"));
    }

    #[tokio::test]
    async fn test_scorecard_tool() {
        let tool = ScorecardTool::new(service(StubGateway::new()));

        let result = tool.execute(Value::Null).await.unwrap();
        let output: Value = serde_json::from_str(&result.output).unwrap();

        assert_eq!(output["profile"], "weekly");
        assert_eq!(output["close_rate_days"], 30);
        assert_eq!(output["scheduled_days"], 14);
        assert!(tool.metadata().parameters.is_empty());
    }
}
