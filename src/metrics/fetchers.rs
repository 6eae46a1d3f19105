//! Metric Fetchers
//!
//! Each fetcher resolves its window, issues one bounded fetch per quantity
//! and reduces the page into scalars. Nothing is retried; a gateway failure
//! aborts the metric.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::sync::Arc;

use super::reduce::{extract_records, sum_amounts};
use super::window::{forward_span, trailing_span, week_offset, Clock, TimestampFormat};
use super::{
    CloseRateMetric, MetricsError, PipelineMetric, RevenueMetric, ScheduledMetric,
    ScorecardProfile, MAX_PAGE_SIZE,
};
use crate::gateway::{collection_key, DataGateway, Query};

pub const JOBS: &str = "jobs";
pub const ESTIMATES: &str = "estimates";

/// One fetched page reduced to its scalars
struct Page {
    total: Decimal,
    count: usize,
    truncated: bool,
    items: Vec<Value>,
}

/// Computes business metrics from the data gateway
pub struct MetricsService {
    gateway: Arc<dyn DataGateway>,
    clock: Arc<dyn Clock>,
    page_size: u32,
    timestamp_format: TimestampFormat,
    profile: ScorecardProfile,
}

impl MetricsService {
    pub fn new(gateway: Arc<dyn DataGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            clock,
            page_size: MAX_PAGE_SIZE,
            timestamp_format: TimestampFormat::default(),
            profile: ScorecardProfile::weekly(),
        }
    }

    /// Records requested per fetch, clamped to 1..=200
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Profile used by `build_scorecard`
    pub fn with_profile(mut self, profile: ScorecardProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn gateway(&self) -> Arc<dyn DataGateway> {
        self.gateway.clone()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn profile(&self) -> &ScorecardProfile {
        &self.profile
    }

    /// Revenue from jobs completed during the week `weeks_back` weeks ago
    pub async fn weekly_revenue(&self, weeks_back: u32) -> Result<RevenueMetric, MetricsError> {
        let window =
            week_offset(self.clock.now(), weeks_back)?.resolve_offsets(self.clock.as_ref());
        tracing::info!(
            "Fetching completed jobs for week {} .. {}",
            window.start,
            window.end
        );

        let page = self
            .fetch_page(
                JOBS,
                &[
                    ("work_status", "complete".to_string()),
                    ("completed_at_min", window.start_param(self.timestamp_format)),
                    ("completed_at_max", window.end_param(self.timestamp_format)),
                ],
            )
            .await?;

        Ok(RevenueMetric {
            week_start: window.start.date(),
            week_end: window.end.date(),
            window,
            total: page.total,
            count: page.count,
            truncated: page.truncated,
            items: page.items,
        })
    }

    /// All pending estimates, no time filter
    pub async fn pipeline_value(&self) -> Result<PipelineMetric, MetricsError> {
        tracing::info!("Fetching pending estimates");

        let page = self
            .fetch_page(ESTIMATES, &[("status", "pending".to_string())])
            .await?;

        Ok(PipelineMetric {
            total: page.total,
            count: page.count,
            truncated: page.truncated,
            items: page.items,
        })
    }

    /// Won / (won + lost) for estimates created in the last `days_back` days
    pub async fn close_rate(&self, days_back: u32) -> Result<CloseRateMetric, MetricsError> {
        let window =
            trailing_span(self.clock.now(), days_back)?.resolve_offsets(self.clock.as_ref());
        let since = window.start_param(self.timestamp_format);
        tracing::info!("Fetching decided estimates since {}", since);

        let won = self
            .fetch_page(
                ESTIMATES,
                &[("status", "won".to_string()), ("created_at_min", since.clone())],
            )
            .await?;
        let lost = self
            .fetch_page(
                ESTIMATES,
                &[("status", "lost".to_string()), ("created_at_min", since)],
            )
            .await?;

        let total_decided = won.count + lost.count;

        Ok(CloseRateMetric {
            period_days: days_back,
            since: window.start,
            rate_percent: close_rate_percent(won.count, total_decided),
            won_count: won.count,
            lost_count: lost.count,
            won_value: won.total,
            lost_value: lost.total,
            total_decided,
            truncated: won.truncated || lost.truncated,
        })
    }

    /// Jobs scheduled to start between now and `days_forward` days from now
    pub async fn scheduled_jobs(&self, days_forward: u32) -> Result<ScheduledMetric, MetricsError> {
        let window =
            forward_span(self.clock.now(), days_forward)?.resolve_offsets(self.clock.as_ref());
        tracing::info!(
            "Fetching scheduled jobs for {} .. {}",
            window.start,
            window.end
        );

        let page = self
            .fetch_page(
                JOBS,
                &[
                    ("work_status", "scheduled".to_string()),
                    ("scheduled_start_min", window.start_param(self.timestamp_format)),
                    ("scheduled_start_max", window.end_param(self.timestamp_format)),
                ],
            )
            .await?;

        Ok(ScheduledMetric {
            period_days: days_forward,
            window,
            total: page.total,
            count: page.count,
            truncated: page.truncated,
            items: page.items,
        })
    }

    /// One bounded fetch, reduced
    async fn fetch_page(
        &self,
        resource: &str,
        filters: &[(&str, String)],
    ) -> Result<Page, MetricsError> {
        let mut query = Query::new();
        query.insert("page_size".to_string(), self.page_size.to_string());
        for (key, value) in filters {
            query.insert(key.to_string(), value.clone());
        }

        let document = self.gateway.fetch(resource, &query).await?;
        let items = extract_records(document, collection_key(resource))?;
        let count = items.len();
        let truncated = count >= self.page_size as usize;

        if truncated {
            tracing::warn!(
                "{} returned a full page of {} records; totals may be incomplete",
                resource,
                count
            );
        }
        tracing::debug!("{} -> {} records", resource, count);

        Ok(Page {
            total: sum_amounts(&items),
            count,
            truncated,
            items,
        })
    }
}

/// Percentage rounded to one decimal place, zero when nothing was decided
///
/// Rounds the exact binary value half to even, so `6.25` becomes `6.2`.
pub fn close_rate_percent(won: usize, total_decided: usize) -> f64 {
    if total_decided == 0 {
        return 0.0;
    }
    let rate = won as f64 / total_decided as f64 * 100.0;
    Decimal::from_f64_retain(rate)
        .map(|exact| exact.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven))
        .and_then(|rounded| rounded.to_f64())
        .unwrap_or(rate)
}
