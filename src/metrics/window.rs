//! Time Window Calculator
//!
//! Turns relative offsets ("last week", "next 14 days") into absolute
//! windows. Every function takes `now` explicitly; the `Clock` trait is the
//! only place the wall clock is read.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Local, NaiveDateTime, NaiveTime, TimeZone,
    Timelike,
};
use serde::{Deserialize, Serialize};

use super::MetricsError;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// UTC offset in effect at a local wall time. Defaults to the offset of `now`.
    fn offset_at(&self, _local: NaiveDateTime) -> FixedOffset {
        *self.now().offset()
    }
}

/// Local wall clock, truncated to whole seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now().fixed_offset();
        now.with_nanosecond(0).unwrap_or(now)
    }

    /// Looked up in the local zone; times skipped by a DST jump fall back to now's offset
    fn offset_at(&self, local: NaiveDateTime) -> FixedOffset {
        Local
            .offset_from_local_datetime(&local)
            .earliest()
            .unwrap_or_else(|| *self.now().offset())
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Textual timestamp format accepted by the data gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    /// `2024-03-11T00:00:00`
    #[default]
    Naive,
    /// `2024-03-11T00:00:00+01:00`
    Offset,
}

impl TimestampFormat {
    pub fn format(&self, timestamp: NaiveDateTime, offset: FixedOffset) -> String {
        match self {
            TimestampFormat::Naive => timestamp.format(WIRE_FORMAT).to_string(),
            TimestampFormat::Offset => format!("{}{}", timestamp.format(WIRE_FORMAT), offset),
        }
    }
}

/// Absolute window in the local time of the clock that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    #[serde(serialize_with = "serialize_wire")]
    pub start: NaiveDateTime,
    #[serde(serialize_with = "serialize_wire")]
    pub end: NaiveDateTime,
    #[serde(skip)]
    pub start_offset: FixedOffset,
    #[serde(skip)]
    pub end_offset: FixedOffset,
}

impl TimeWindow {
    fn new(start: NaiveDateTime, end: NaiveDateTime, offset: FixedOffset) -> Self {
        Self {
            start,
            end,
            start_offset: offset,
            end_offset: offset,
        }
    }

    /// Re-stamp each bound with the offset `clock` reports at that bound
    pub fn resolve_offsets(self, clock: &dyn Clock) -> Self {
        Self {
            start_offset: clock.offset_at(self.start),
            end_offset: clock.offset_at(self.end),
            ..self
        }
    }

    pub fn start_param(&self, format: TimestampFormat) -> String {
        format.format(self.start, self.start_offset)
    }

    pub fn end_param(&self, format: TimestampFormat) -> String {
        format.format(self.end, self.end_offset)
    }
}

fn serialize_wire<S: serde::Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(WIRE_FORMAT))
}

/// Monday-to-Sunday calendar week, `weeks_back` weeks before the current one
pub fn week_offset(now: DateTime<FixedOffset>, weeks_back: u32) -> Result<TimeWindow, MetricsError> {
    let today = now.date_naive();
    let since_monday = u64::from(today.weekday().num_days_from_monday());
    let back = u64::from(weeks_back) * 7 + since_monday;

    let monday = today
        .checked_sub_days(Days::new(back))
        .ok_or(MetricsError::WindowOutOfRange { offset: weeks_back, unit: "weeks" })?;
    let start = monday.and_time(NaiveTime::MIN);
    // Sunday 23:59:59, inclusive
    let end = start
        .checked_add_signed(Duration::days(7) - Duration::seconds(1))
        .ok_or(MetricsError::WindowOutOfRange { offset: weeks_back, unit: "weeks" })?;

    Ok(TimeWindow::new(start, end, *now.offset()))
}

/// From now until the same time of day `days_forward` days ahead
pub fn forward_span(now: DateTime<FixedOffset>, days_forward: u32) -> Result<TimeWindow, MetricsError> {
    let start = now.naive_local();
    let end = start
        .checked_add_days(Days::new(u64::from(days_forward)))
        .ok_or(MetricsError::WindowOutOfRange { offset: days_forward, unit: "days" })?;

    Ok(TimeWindow::new(start, end, *now.offset()))
}

/// From `days_back` days ago until now; only `start` is used as a filter
pub fn trailing_span(now: DateTime<FixedOffset>, days_back: u32) -> Result<TimeWindow, MetricsError> {
    let end = now.naive_local();
    let start = end
        .checked_sub_days(Days::new(u64::from(days_back)))
        .ok_or(MetricsError::WindowOutOfRange { offset: days_back, unit: "days" })?;

    Ok(TimeWindow::new(start, end, *now.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(-5 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_current_week_from_wednesday() {
        let window = week_offset(at(2024, 3, 13, 15, 42, 7), 0).unwrap();

        assert_eq!(window.start, naive(2024, 3, 11, 0, 0, 0));
        assert_eq!(window.end, naive(2024, 3, 17, 23, 59, 59));
    }

    #[test]
    fn test_previous_week() {
        let window = week_offset(at(2024, 3, 13, 15, 42, 7), 1).unwrap();

        assert_eq!(window.start, naive(2024, 3, 4, 0, 0, 0));
        assert_eq!(window.end, naive(2024, 3, 10, 23, 59, 59));
    }

    #[test]
    fn test_week_boundaries_hold_for_every_weekday_and_offset() {
        // 2024-03-11 is a Monday; walk a full week of reference days
        for day in 11..=17 {
            let now = at(2024, 3, day, 9, 30, 0);
            for weeks_back in 0..12 {
                let window = week_offset(now, weeks_back).unwrap();
                let next = week_offset(now, weeks_back + 1).unwrap();

                assert_eq!(window.start.weekday(), Weekday::Mon);
                assert_eq!(window.start.time(), NaiveTime::MIN);
                assert_eq!(window.end.weekday(), Weekday::Sun);
                assert_eq!(window.end.time(), NaiveTime::from_hms_opt(23, 59, 59).unwrap());
                assert_eq!(window.end - window.start, Duration::days(7) - Duration::seconds(1));
                assert_eq!(window.start, next.start + Duration::days(7));
                assert!(window.start <= window.end);
            }
        }
    }

    #[test]
    fn test_sunday_belongs_to_the_week_that_started_on_monday() {
        let window = week_offset(at(2024, 3, 17, 23, 0, 0), 0).unwrap();
        assert_eq!(window.start, naive(2024, 3, 11, 0, 0, 0));
    }

    #[test]
    fn test_week_crossing_year_boundary() {
        let window = week_offset(at(2025, 1, 1, 8, 0, 0), 0).unwrap();

        assert_eq!(window.start, naive(2024, 12, 30, 0, 0, 0));
        assert_eq!(window.end, naive(2025, 1, 5, 23, 59, 59));
    }

    #[test]
    fn test_forward_span_keeps_time_of_day() {
        let window = forward_span(at(2024, 3, 13, 15, 42, 7), 14).unwrap();

        assert_eq!(window.start, naive(2024, 3, 13, 15, 42, 7));
        assert_eq!(window.end, naive(2024, 3, 27, 15, 42, 7));
    }

    #[test]
    fn test_zero_length_spans() {
        let now = at(2024, 3, 13, 15, 42, 7);

        let forward = forward_span(now, 0).unwrap();
        assert_eq!(forward.start, forward.end);

        let trailing = trailing_span(now, 0).unwrap();
        assert_eq!(trailing.start, trailing.end);
    }

    #[test]
    fn test_trailing_span() {
        let window = trailing_span(at(2024, 3, 13, 15, 42, 7), 30).unwrap();

        assert_eq!(window.start, naive(2024, 2, 12, 15, 42, 7));
        assert_eq!(window.end, naive(2024, 3, 13, 15, 42, 7));
    }

    #[test]
    fn test_out_of_range_offset_is_an_error() {
        let result = trailing_span(at(2024, 3, 13, 0, 0, 0), u32::MAX);
        assert!(matches!(result, Err(MetricsError::WindowOutOfRange { .. })));
    }

    #[test]
    fn test_timestamp_formats() {
        let window = week_offset(at(2024, 3, 13, 15, 42, 7), 0).unwrap();

        assert_eq!(window.start_param(TimestampFormat::Naive), "2024-03-11T00:00:00");
        assert_eq!(window.end_param(TimestampFormat::Naive), "2024-03-17T23:59:59");
        assert_eq!(window.start_param(TimestampFormat::Offset), "2024-03-11T00:00:00-05:00");
    }

    #[test]
    fn test_system_clock_has_no_subseconds() {
        assert_eq!(SystemClock.now().nanosecond(), 0);
    }

    #[test]
    fn test_window_serializes_in_wire_format() {
        let window = forward_span(at(2024, 3, 13, 15, 42, 7), 1).unwrap();
        let json = serde_json::to_value(window).unwrap();

        assert_eq!(json["start"], "2024-03-13T15:42:07");
        assert_eq!(json["end"], "2024-03-14T15:42:07");
        assert!(json.get("start_offset").is_none());
    }

    /// Central European time with the 2024-03-31 switch to summer time
    struct BerlinClock(DateTime<FixedOffset>);

    impl Clock for BerlinClock {
        fn now(&self) -> DateTime<FixedOffset> {
            self.0
        }

        fn offset_at(&self, local: NaiveDateTime) -> FixedOffset {
            let switch = naive(2024, 3, 31, 2, 0, 0);
            let hours = if local < switch { 1 } else { 2 };
            FixedOffset::east_opt(hours * 3600).unwrap()
        }
    }

    #[test]
    fn test_bounds_take_their_own_offset_across_dst() {
        let now = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 4, 3, 9, 0, 0)
            .unwrap();
        let clock = BerlinClock(now);

        // Monday 2024-03-25 .. Sunday 2024-03-31 straddles the switch
        let window = week_offset(now, 1).unwrap().resolve_offsets(&clock);

        assert_eq!(window.start_param(TimestampFormat::Offset), "2024-03-25T00:00:00+01:00");
        assert_eq!(window.end_param(TimestampFormat::Offset), "2024-03-31T23:59:59+02:00");
        assert_eq!(window.start_param(TimestampFormat::Naive), "2024-03-25T00:00:00");
    }

    #[test]
    fn test_fixed_clock_keeps_one_offset() {
        let clock = FixedClock(at(2024, 3, 13, 15, 42, 7));
        let window = week_offset(clock.now(), 2).unwrap().resolve_offsets(&clock);

        assert_eq!(window.start_offset, window.end_offset);
        assert_eq!(window.start_param(TimestampFormat::Offset), "2024-02-26T00:00:00-05:00");
    }
}
