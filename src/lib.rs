//! hcp-scorecard - Housecall Pro scorecard metrics as MCP tools
//!
//! Turns relative time ranges into absolute query windows, fetches jobs and
//! estimates from the Housecall Pro API and reduces them into weekly
//! scorecard metrics.

mod config;
pub mod core;
pub mod gateway;
pub mod metrics;
pub mod tools;
pub mod utils;

pub mod api;
pub mod cli;

pub use api::*;
pub use self::config::Settings;

pub use self::core::mcp::MCPServer;
pub use gateway::{DataGateway, GatewayError, HttpGateway};
pub use metrics::{MetricsError, MetricsService, ScorecardProfile, ScorecardReport};
pub use tools::registry::ToolRegistry;

use anyhow::Result;
use metrics::SystemClock;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static SYSTEM: OnceCell<System> = OnceCell::new();

/// Immutable wiring shared by the facade functions
pub struct System {
    service: Arc<MetricsService>,
}

impl System {
    fn new(settings: &Settings, api_key: String) -> Self {
        Self {
            service: Arc::new(build_service(settings, api_key)),
        }
    }

    fn global() -> Result<&'static System> {
        SYSTEM
            .get()
            .ok_or_else(|| anyhow::anyhow!("System not initialized. Call init() first"))
    }
}

/// Metrics service talking to the Housecall Pro API as configured
pub fn build_service(settings: &Settings, api_key: String) -> MetricsService {
    let gateway = HttpGateway::new(api_key)
        .with_base_url(settings.gateway.base_url.clone())
        .with_auth_scheme(settings.gateway.auth_scheme.clone())
        .with_timeout(settings.gateway.timeout_secs);

    MetricsService::new(Arc::new(gateway), Arc::new(SystemClock))
        .with_page_size(settings.metrics.page_size)
        .with_timestamp_format(settings.gateway.timestamp_format)
        .with_profile(settings.scorecard.clone())
}

/// Initialize the system from settings and `HOUSECALL_PRO_API_KEY`
/// Must be called before using any API functions
pub async fn init() -> Result<()> {
    let settings = Settings::new()?;
    init_with(&settings)
}

/// Initialize the system from already loaded settings
pub fn init_with(settings: &Settings) -> Result<()> {
    let api_key = Settings::api_key()?;

    SYSTEM
        .set(System::new(settings, api_key))
        .map_err(|_| anyhow::anyhow!("System already initialized"))?;

    tracing::info!(
        "Scorecard system initialized against {}",
        settings.gateway.base_url
    );
    Ok(())
}

/// Registry of every tool, sharing the initialized service
pub fn registry() -> Result<ToolRegistry> {
    Ok(ToolRegistry::with_defaults(System::global()?.service.clone()))
}
