use std::{fmt, ops::RangeInclusive};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use market_data_ingestor::models::timeframe::TimeFrame;

use crate::tz::{MARKET_TZ, TimeError, from_local_naive, market_date, market_midnight};

/// How far back an open-ended request reaches by default.
const DEFAULT_LOOKBACK: TimeDelta = TimeDelta::minutes(10);

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Half-open `[start, end)` span of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeError> {
        if start >= end {
            return Err(TimeError::EmptyWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a window from optional user input.
    ///
    /// A missing start means `now - 10min`; a missing end means one bar after
    /// the start.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        timeframe: TimeFrame,
        now: DateTime<Utc>,
    ) -> Result<Self, TimeError> {
        let start = match start {
            Some(raw) => parse_user_timestamp(raw)?,
            None => now - DEFAULT_LOOKBACK,
        };
        let end = match end {
            Some(raw) => parse_user_timestamp(raw)?,
            None => start + timeframe.duration(),
        };
        Self::new(start, end)
    }

    /// Jan 1 00:00 through Dec 31 23:59:59, New York time.
    pub fn year(year: i32) -> Result<Self, TimeError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(TimeError::BadYear(year))?;
        let last = NaiveDate::from_ymd_opt(year, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .ok_or(TimeError::BadYear(year))?;
        Self::new(
            market_midnight(first)?,
            from_local_naive(last, MARKET_TZ)?,
        )
    }

    /// New York date of the first instant.
    pub fn first_date(&self) -> NaiveDate {
        market_date(self.start)
    }

    /// New York date of the last instant inside the window.
    pub fn last_date(&self) -> NaiveDate {
        market_date(self.end - TimeDelta::nanoseconds(1))
    }

    /// Calendar years (New York) the window touches.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_date().year()..=self.last_date().year()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Parses a timestamp typed by a user.
///
/// Accepts RFC 3339 with an explicit offset, a naive date-time read as New
/// York wall-clock time, or a bare date meaning New York midnight.
pub fn parse_user_timestamp(raw: &str) -> Result<DateTime<Utc>, TimeError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return from_local_naive(naive, MARKET_TZ);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return market_midnight(date);
    }
    Err(TimeError::Unparseable {
        input: raw.to_string(),
    })
}

/// One window per calendar year, `start_year..=end_year`.
pub fn year_ranges(start_year: i32, end_year: i32) -> Result<Vec<TimeWindow>, TimeError> {
    (start_year..=end_year).map(TimeWindow::year).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn accepts_offset_naive_and_date_inputs() {
        assert_eq!(
            parse_user_timestamp("2024-01-02T09:30:00-05:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
        );
        // July is EDT.
        assert_eq!(
            parse_user_timestamp("2024-07-02T09:30").unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 2, 13, 30, 0).unwrap()
        );
        assert_eq!(
            parse_user_timestamp(" 2024-01-02 ").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_user_timestamp("yesterday"),
            Err(TimeError::Unparseable { .. })
        ));
    }

    #[test]
    fn dst_edges_resolve_to_one_instant() {
        assert_eq!(
            parse_user_timestamp("2024-03-10 02:30").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).unwrap()
        );
        assert_eq!(
            parse_user_timestamp("2024-11-03T01:30").unwrap(),
            Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap()
        );
    }

    #[test]
    fn defaults_fill_missing_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap();
        let w = TimeWindow::resolve(None, None, TimeFrame::minutes(30), now).unwrap();
        assert_eq!(w.start, Utc.with_ymd_and_hms(2024, 1, 2, 14, 50, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2024, 1, 2, 15, 20, 0).unwrap());

        let w = TimeWindow::resolve(Some("2024-01-02"), None, TimeFrame::hours(1), now).unwrap();
        assert_eq!(w.end - w.start, TimeDelta::hours(1));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let err = TimeWindow::resolve(
            Some("2024-02-01"),
            Some("2024-01-01"),
            TimeFrame::default(),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, TimeError::EmptyWindow { .. }));
    }

    #[test]
    fn year_windows_follow_new_york_time() {
        let windows = year_ranges(2023, 2024).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, Utc.with_ymd_and_hms(2023, 1, 1, 5, 0, 0).unwrap());
        assert_eq!(windows[0].end, Utc.with_ymd_and_hms(2024, 1, 1, 4, 59, 59).unwrap());
        assert_eq!(windows[1].years(), 2024..=2024);
        assert_eq!(windows[1].last_date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!(year_ranges(2025, 2024).unwrap().is_empty());
    }

    #[test]
    fn multi_year_window_lists_each_year() {
        let w = TimeWindow::new(
            Utc.with_ymd_and_hms(2022, 12, 30, 15, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(w.years(), 2022..=2024);
    }
}
