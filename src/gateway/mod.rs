//! Data Gateway - read access to the field-service back end
//!
//! Information Hiding:
//! - Transport, authentication and content negotiation hidden behind trait
//! - Callers only see resource names, string query parameters and JSON
//! - Failures classified as transport or upstream, never retried here

pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub use http::HttpGateway;

/// Query parameters sent with a fetch. Ordered so requests are reproducible.
pub type Query = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("response from '{resource}' is not valid JSON: {message}")]
    Decode { resource: String, message: String },
}

impl GatewayError {
    /// Connection level failure, as opposed to a response from the back end
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport(_) | GatewayError::Timeout { .. })
    }
}

/// Gateway trait - anything that can answer `fetch(resource, query)` with JSON
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Fetch one page of `resource` (e.g. `jobs`, `estimates/est_123`)
    async fn fetch(&self, resource: &str, query: &Query) -> Result<Value, GatewayError>;
}

/// Top-level collection key of a resource path: `jobs/123` -> `jobs`
pub fn collection_key(resource: &str) -> &str {
    resource
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or(resource)
}
