//! Metrics - time windows, record reduction and scorecard composition
//!
//! Information Hiding:
//! - Window arithmetic hidden behind `window`
//! - Query construction and reduction hidden inside `MetricsService`
//! - Callers receive immutable metric values, never raw gateway documents

pub mod fetchers;
pub mod reduce;
pub mod scorecard;
pub mod window;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::gateway::GatewayError;

pub use fetchers::MetricsService;
pub use scorecard::{ScorecardProfile, ScorecardReport};
pub use window::{Clock, FixedClock, SystemClock, TimeWindow, TimestampFormat};

/// Largest page the back end will return for one request
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("offset of {offset} {unit} is outside the supported date range")]
    WindowOutOfRange { offset: u32, unit: &'static str },

    #[error("unexpected response shape from '{resource}': {detail}")]
    UnexpectedShape { resource: String, detail: String },
}

/// Revenue from jobs completed within one calendar week
#[derive(Debug, Clone, Serialize)]
pub struct RevenueMetric {
    /// Monday, serialized as `YYYY-MM-DD`
    pub week_start: NaiveDate,
    /// Sunday, serialized as `YYYY-MM-DD`
    pub week_end: NaiveDate,
    pub window: TimeWindow,
    #[serde(rename = "total_revenue", with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(rename = "job_count")]
    pub count: usize,
    pub truncated: bool,
    #[serde(rename = "jobs")]
    pub items: Vec<Value>,
}

/// Value of all pending estimates
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetric {
    #[serde(rename = "total_pipeline_value", with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(rename = "estimate_count")]
    pub count: usize,
    pub truncated: bool,
    #[serde(rename = "estimates")]
    pub items: Vec<Value>,
}

/// Won versus lost estimates over a trailing period
#[derive(Debug, Clone, Serialize)]
pub struct CloseRateMetric {
    pub period_days: u32,
    #[serde(serialize_with = "serialize_naive")]
    pub since: NaiveDateTime,
    #[serde(rename = "close_rate_percent")]
    pub rate_percent: f64,
    pub won_count: usize,
    pub lost_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub won_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub lost_value: Decimal,
    pub total_decided: usize,
    pub truncated: bool,
}

/// Jobs scheduled to start within the coming days
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledMetric {
    pub period_days: u32,
    pub window: TimeWindow,
    #[serde(rename = "total_scheduled_value", with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(rename = "job_count")]
    pub count: usize,
    pub truncated: bool,
    #[serde(rename = "jobs")]
    pub items: Vec<Value>,
}

fn serialize_naive<S: serde::Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format("%Y-%m-%dT%H:%M:%S"))
}
