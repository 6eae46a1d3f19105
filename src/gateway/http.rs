//! HTTP Data Gateway
//!
//! Information Hiding:
//! - reqwest client and header construction hidden
//! - API key never leaves this module
//! - Timeout handling internalized

use super::{DataGateway, GatewayError, Query};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tokio::time::{timeout, Duration};

pub const DEFAULT_BASE_URL: &str = "https://api.housecallpro.com";

/// Gateway backed by the Housecall Pro REST API
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_key: String,
    auth_scheme: String,
    timeout_secs: u64,
}

impl HttpGateway {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            auth_scheme: "Token".to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `Token` for API keys, `Bearer` for OAuth access tokens
    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource.trim_start_matches('/'))
    }
}

#[async_trait]
impl DataGateway for HttpGateway {
    async fn fetch(&self, resource: &str, query: &Query) -> Result<Value, GatewayError> {
        let url = self.url(resource);
        tracing::debug!("GET {} {:?}", url, query);

        let request_future = async {
            let response = self
                .client
                .get(&url)
                .header(AUTHORIZATION, format!("{} {}", self.auth_scheme, self.api_key))
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json")
                .query(query)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, GatewayError>((status, body))
        };

        let (status, body) = match timeout(Duration::from_secs(self.timeout_secs), request_future).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!("Request to {} timed out after {}s", resource, self.timeout_secs);
                return Err(GatewayError::Timeout {
                    secs: self.timeout_secs,
                });
            }
        };

        if !status.is_success() {
            tracing::error!("Request to {} failed with HTTP {}", resource, status);
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }
}
