//! Simple async API facade
//!
//! One function per scorecard operation, backed by the service installed
//! by `init()`.

use crate::metrics::{
    CloseRateMetric, PipelineMetric, RevenueMetric, ScheduledMetric, ScorecardReport,
};
use crate::System;
use anyhow::Result;

/// Revenue from jobs completed during the week `weeks_back` weeks ago
///
/// # Example
/// ```no_run
/// use hcp_scorecard::{init, get_weekly_revenue};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     init().await?;
///     let last_week = get_weekly_revenue(1).await?;
///     println!("{} jobs, {}", last_week.count, last_week.total);
///     Ok(())
/// }
/// ```
pub async fn get_weekly_revenue(weeks_back: u32) -> Result<RevenueMetric> {
    Ok(System::global()?.service.weekly_revenue(weeks_back).await?)
}

/// All pending estimates
pub async fn get_pipeline_value() -> Result<PipelineMetric> {
    Ok(System::global()?.service.pipeline_value().await?)
}

/// Close rate over the last `days_back` days
pub async fn get_close_rate(days_back: u32) -> Result<CloseRateMetric> {
    Ok(System::global()?.service.close_rate(days_back).await?)
}

/// Jobs scheduled over the next `days_forward` days
pub async fn get_scheduled_jobs(days_forward: u32) -> Result<ScheduledMetric> {
    Ok(System::global()?.service.scheduled_jobs(days_forward).await?)
}

/// Every metric of the configured scorecard profile
pub async fn get_scorecard_metrics() -> Result<ScorecardReport> {
    Ok(System::global()?.service.build_scorecard().await?)
}
