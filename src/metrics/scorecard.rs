//! Scorecard Composer
//!
//! Runs the five independent sub-metrics of a profile concurrently and
//! merges their scalars. The first failure aborts the whole report.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::{Clock, MetricsError, MetricsService};

/// Which windows a scorecard covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorecardProfile {
    pub name: String,
    pub current_weeks_back: u32,
    pub prior_weeks_back: u32,
    pub close_rate_days: u32,
    pub scheduled_days: u32,
}

impl ScorecardProfile {
    /// This week, last week, 30-day close rate, next 14 days scheduled
    pub fn weekly() -> Self {
        Self {
            name: "weekly".to_string(),
            current_weeks_back: 0,
            prior_weeks_back: 1,
            close_rate_days: 30,
            scheduled_days: 14,
        }
    }
}

impl Default for ScorecardProfile {
    fn default() -> Self {
        Self::weekly()
    }
}

/// Flat scalars of one scorecard run
///
/// Serialized keys carry the period of the close rate and scheduled metrics,
/// e.g. `close_rate_30d` and `scheduled_jobs_14d` for the weekly profile.
#[derive(Debug, Clone)]
pub struct ScorecardReport {
    pub profile: String,
    pub generated_at: DateTime<FixedOffset>,
    pub this_week_revenue: Decimal,
    pub this_week_jobs: usize,
    pub last_week_revenue: Decimal,
    pub last_week_jobs: usize,
    pub pipeline_value: Decimal,
    pub pipeline_count: usize,
    pub close_rate_days: u32,
    pub close_rate_percent: f64,
    pub won_count: usize,
    pub lost_count: usize,
    pub scheduled_days: u32,
    pub scheduled_value: Decimal,
    pub scheduled_jobs: usize,
    /// Some sub-metric filled a whole page
    pub truncated: bool,
}

#[derive(Serialize)]
struct Amount(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Serialize for ScorecardReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let close = self.close_rate_days;
        let ahead = self.scheduled_days;

        let mut map = serializer.serialize_map(Some(16))?;
        map.serialize_entry("profile", &self.profile)?;
        map.serialize_entry("generated_at", &self.generated_at)?;
        map.serialize_entry("this_week_revenue", &Amount(self.this_week_revenue))?;
        map.serialize_entry("this_week_jobs", &self.this_week_jobs)?;
        map.serialize_entry("last_week_revenue", &Amount(self.last_week_revenue))?;
        map.serialize_entry("last_week_jobs", &self.last_week_jobs)?;
        map.serialize_entry("pipeline_value", &Amount(self.pipeline_value))?;
        map.serialize_entry("pipeline_count", &self.pipeline_count)?;
        map.serialize_entry("close_rate_days", &close)?;
        map.serialize_entry(&format!("close_rate_{}d", close), &self.close_rate_percent)?;
        map.serialize_entry(&format!("won_{}d", close), &self.won_count)?;
        map.serialize_entry(&format!("lost_{}d", close), &self.lost_count)?;
        map.serialize_entry("scheduled_days", &ahead)?;
        map.serialize_entry(&format!("scheduled_value_{}d", ahead), &Amount(self.scheduled_value))?;
        map.serialize_entry(&format!("scheduled_jobs_{}d", ahead), &self.scheduled_jobs)?;
        map.serialize_entry("truncated", &self.truncated)?;
        map.end()
    }
}

impl MetricsService {
    /// Scorecard for the configured profile
    pub async fn build_scorecard(&self) -> Result<ScorecardReport, MetricsError> {
        let profile = self.profile().clone();
        self.build_scorecard_with(&profile).await
    }

    pub async fn build_scorecard_with(
        &self,
        profile: &ScorecardProfile,
    ) -> Result<ScorecardReport, MetricsError> {
        tracing::info!("Building '{}' scorecard", profile.name);

        let (this_week, last_week, pipeline, close_rate, scheduled) = tokio::try_join!(
            self.weekly_revenue(profile.current_weeks_back),
            self.weekly_revenue(profile.prior_weeks_back),
            self.pipeline_value(),
            self.close_rate(profile.close_rate_days),
            self.scheduled_jobs(profile.scheduled_days),
        )?;

        let truncated = this_week.truncated
            || last_week.truncated
            || pipeline.truncated
            || close_rate.truncated
            || scheduled.truncated;

        Ok(ScorecardReport {
            profile: profile.name.clone(),
            generated_at: self.clock().now(),
            this_week_revenue: this_week.total,
            this_week_jobs: this_week.count,
            last_week_revenue: last_week.total,
            last_week_jobs: last_week.count,
            pipeline_value: pipeline.total,
            pipeline_count: pipeline.count,
            close_rate_days: close_rate.period_days,
            close_rate_percent: close_rate.rate_percent,
            won_count: close_rate.won_count,
            lost_count: close_rate.lost_count,
            scheduled_days: scheduled.period_days,
            scheduled_value: scheduled.total,
            scheduled_jobs: scheduled.count,
            truncated,
        })
    }
}
