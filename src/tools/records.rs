//! Record Lookup Tools
//!
//! Raw reads of customers, estimates, jobs, employees and invoices. Each
//! call is a single gateway fetch whose document is returned untouched.

use super::{count_arg, Tool, ToolMetadata, ToolParameter, ToolResult};
use crate::gateway::{DataGateway, Query};
use crate::metrics::MAX_PAGE_SIZE;
use crate::{optional_string, validate_required_string};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

async fn fetch_result(gateway: &dyn DataGateway, resource: &str, query: &Query) -> Result<ToolResult> {
    match gateway.fetch(resource, query).await {
        Ok(document) => ToolResult::json(&document),
        Err(e) => {
            tracing::error!("Fetching {} failed: {}", resource, e);
            Ok(ToolResult::failure(e.to_string()))
        }
    }
}

/// Paged listing of one resource with optional string filters
pub struct ListRecordsTool {
    gateway: Arc<dyn DataGateway>,
    resource: &'static str,
    description: &'static str,
    default_page_size: u32,
    filters: &'static [(&'static str, &'static str)],
}

impl ListRecordsTool {
    pub fn customers(gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway,
            resource: "customers",
            description: "Get a list of customers with contact info.",
            default_page_size: 20,
            filters: &[("q", "Search customers by name, email, or phone")],
        }
    }

    pub fn estimates(gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway,
            resource: "estimates",
            description: "Get estimates with amounts, status and customer info.",
            default_page_size: 50,
            filters: &[
                ("status", "Filter by status: pending, won, lost, expired"),
                ("scheduled_start_min", "Estimates scheduled after this time (YYYY-MM-DDTHH:MM:SS)"),
                ("scheduled_start_max", "Estimates scheduled before this time"),
                ("created_at_min", "Estimates created after this time"),
                ("created_at_max", "Estimates created before this time"),
            ],
        }
    }

    pub fn jobs(gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway,
            resource: "jobs",
            description: "Get jobs with revenue, status and scheduled times.",
            default_page_size: 50,
            filters: &[
                ("work_status", "Filter by status: scheduled, in_progress, complete, canceled"),
                ("scheduled_start_min", "Jobs scheduled after this time (YYYY-MM-DDTHH:MM:SS)"),
                ("scheduled_start_max", "Jobs scheduled before this time"),
                ("completed_at_min", "Jobs completed after this time"),
                ("completed_at_max", "Jobs completed before this time"),
            ],
        }
    }

    pub fn employees(gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway,
            resource: "employees",
            description: "Get employees with roles and contact info.",
            default_page_size: 50,
            filters: &[],
        }
    }

    pub fn invoices(gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway,
            resource: "invoices",
            description: "Get invoices with amounts, status and customer info.",
            default_page_size: 50,
            filters: &[
                ("status", "Filter by status: draft, sent, paid, partial, void"),
                ("created_at_min", "Invoices created after this time (YYYY-MM-DDTHH:MM:SS)"),
                ("created_at_max", "Invoices created before this time"),
            ],
        }
    }

    fn build_query(&self, args: &Value) -> Result<Query> {
        let page = count_arg(args, "page", 1, u32::MAX)?.max(1);
        let page_size = count_arg(args, "page_size", self.default_page_size, u32::MAX)?
            .clamp(1, MAX_PAGE_SIZE);

        let mut query = Query::new();
        query.insert("page".to_string(), page.to_string());
        query.insert("page_size".to_string(), page_size.to_string());
        for (name, _) in self.filters {
            if let Some(value) = optional_string!(args, *name) {
                query.insert(name.to_string(), value.trim().to_string());
            }
        }
        Ok(query)
    }
}

#[async_trait]
impl Tool for ListRecordsTool {
    fn metadata(&self) -> ToolMetadata {
        let mut parameters = vec![
            ToolParameter {
                name: "page".to_string(),
                param_type: "integer".to_string(),
                description: "Page number (default 1)".to_string(),
                required: false,
            },
            ToolParameter {
                name: "page_size".to_string(),
                param_type: "integer".to_string(),
                description: format!(
                    "Results per page (default {}, max {})",
                    self.default_page_size, MAX_PAGE_SIZE
                ),
                required: false,
            },
        ];
        parameters.extend(self.filters.iter().map(|(name, description)| ToolParameter {
            name: name.to_string(),
            param_type: "string".to_string(),
            description: description.to_string(),
            required: false,
        }));

        ToolMetadata {
            name: format!("get_{}", self.resource),
            description: self.description.to_string(),
            parameters,
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        self.build_query(args).map(|_| ())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        self.validate(&args)?;

        let query = self.build_query(&args)?;
        fetch_result(self.gateway.as_ref(), self.resource, &query).await
    }
}

/// Single record by id
pub struct GetRecordTool {
    gateway: Arc<dyn DataGateway>,
    resource: &'static str,
    singular: &'static str,
}

impl GetRecordTool {
    pub fn new(gateway: Arc<dyn DataGateway>, resource: &'static str, singular: &'static str) -> Self {
        Self {
            gateway,
            resource,
            singular,
        }
    }

    fn id_param(&self) -> String {
        format!("{}_id", self.singular)
    }

    fn record_id<'a>(&self, args: &'a Value) -> Result<&'a str> {
        let param = self.id_param();
        let id = validate_required_string!(args, param.as_str()).trim();

        if id.is_empty() || id.contains('/') {
            return Err(anyhow::anyhow!("'{}' is not a valid {} id", id, self.singular));
        }
        Ok(id)
    }
}

#[async_trait]
impl Tool for GetRecordTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: format!("get_{}", self.singular),
            description: format!("Get details for a specific {}.", self.singular),
            parameters: vec![ToolParameter {
                name: self.id_param(),
                param_type: "string".to_string(),
                description: format!("The Housecall Pro {} ID", self.singular),
                required: true,
            }],
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        self.record_id(args).map(|_| ())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        self.validate(&args)?;

        let id = self.record_id(&args)?;
        let resource = format!("{}/{}", self.resource, id);
        fetch_result(self.gateway.as_ref(), &resource, &Query::new()).await
    }
}

/// Every record lookup tool over one gateway
pub fn record_tools(gateway: Arc<dyn DataGateway>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListRecordsTool::customers(gateway.clone())),
        Arc::new(GetRecordTool::new(gateway.clone(), "customers", "customer")),
        Arc::new(ListRecordsTool::estimates(gateway.clone())),
        Arc::new(GetRecordTool::new(gateway.clone(), "estimates", "estimate")),
        Arc::new(ListRecordsTool::jobs(gateway.clone())),
        Arc::new(GetRecordTool::new(gateway.clone(), "jobs", "job")),
        Arc::new(ListRecordsTool::employees(gateway.clone())),
        Arc::new(GetRecordTool::new(gateway.clone(), "employees", "employee")),
        Arc::new(ListRecordsTool::invoices(gateway)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::stub::StubGateway;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_jobs_passes_filters() {
        let gateway = Arc::new(StubGateway::new());
        let tool = ListRecordsTool::jobs(gateway.clone());

        let result = tool
            .execute(json!({"work_status": "scheduled", "page_size": 500, "completed_at_min": "", "unknown": "x"}))
            .await
            .unwrap();
        assert!(result.success);

        let (resource, query) = &gateway.calls()[0];
        assert_eq!(resource, "jobs");
        assert_eq!(query["page"], "1");
        assert_eq!(query["page_size"], "200");
        assert_eq!(query["work_status"], "scheduled");
        assert!(!query.contains_key("completed_at_min"));
        assert!(!query.contains_key("unknown"));
    }

    #[tokio::test]
    async fn test_customers_default_page_size_and_search() {
        let gateway = Arc::new(StubGateway::new());
        let tool = ListRecordsTool::customers(gateway.clone());

        tool.execute(json!({"q": "smith", "page": 3})).await.unwrap();

        let (_, query) = &gateway.calls()[0];
        assert_eq!(query["page"], "3");
        assert_eq!(query["page_size"], "20");
        assert_eq!(query["q"], "smith");
        assert_eq!(tool.metadata().name, "get_customers");
    }

    #[tokio::test]
    async fn test_get_record_by_id() {
        let gateway = Arc::new(
            StubGateway::new().with_document("jobs/job_42", json!({"id": "job_42", "total_amount": 90})),
        );
        let tool = GetRecordTool::new(gateway.clone(), "jobs", "job");

        let result = tool.execute(json!({"job_id": "job_42"})).await.unwrap();
        let output: Value = serde_json::from_str(&result.output).unwrap();

        assert_eq!(output["id"], "job_42");
        assert_eq!(tool.metadata().parameters[0].name, "job_id");
    }

    #[tokio::test]
    async fn test_get_record_rejects_bad_ids() {
        let tool = GetRecordTool::new(Arc::new(StubGateway::new()), "customers", "customer");

        assert!(tool.validate(&json!({})).is_err());
        assert!(tool.validate(&json!({"customer_id": "  "})).is_err());
        assert!(tool.validate(&json!({"customer_id": "../jobs"})).is_err());
        assert!(tool.validate(&json!({"customer_id": "cus_1"})).is_ok());
    }

    #[tokio::test]
    async fn test_bad_id_is_rejected_before_fetching() {
        let gateway = Arc::new(StubGateway::new());
        let tool = GetRecordTool::new(gateway.clone(), "customers", "customer");

        assert!(tool.execute(json!({"customer_id": "a/b"})).await.is_err());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_record_tool_names() {
        let names: Vec<String> = record_tools(Arc::new(StubGateway::new()))
            .iter()
            .map(|tool| tool.metadata().name)
            .collect();

        assert_eq!(names.len(), 9);
        assert!(names.contains(&"get_invoices".to_string()));
        assert!(names.contains(&"get_employee".to_string()));
    }
}
