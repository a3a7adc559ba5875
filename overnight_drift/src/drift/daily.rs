use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveTime};
use market_data_ingestor::models::{bar::Bar, calendar::TradingDay};
use serde::Serialize;

use super::AnalysisError;
use crate::tz::to_market_time;

/// Drift from one session to the next.
///
/// `intraday_drift` runs from `date`'s open to its close, `overnight_drift`
/// from that close to `next_date`'s open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDrift {
    pub date: NaiveDate,
    pub next_date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub next_open: f64,
    pub intraday_drift: f64,
    pub overnight_drift: f64,
    pub intraday_pct: f64,
    pub overnight_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftSummary {
    pub periods: usize,
    pub overnight_total: f64,
    pub overnight_avg: f64,
    pub intraday_total: f64,
    pub intraday_avg: f64,
    pub overnight_pct_avg: f64,
    pub intraday_pct_avg: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct SessionMarks {
    open: Option<f64>,
    close: Option<(NaiveTime, f64)>,
}

impl SessionMarks {
    fn prices(&self) -> Option<(f64, f64)> {
        Some((self.open?, self.close?.1))
    }
}

/// Opening and closing prints per trading day.
///
/// The open is the open of the bar starting exactly at the calendar open. The
/// close is the close of the latest bar starting inside the session, so half
/// days close on their 12:30 bar rather than a 15:30 bar that never prints.
fn session_marks(
    bars: &[Bar],
    days: &HashMap<NaiveDate, TradingDay>,
) -> BTreeMap<NaiveDate, SessionMarks> {
    let mut marks: BTreeMap<NaiveDate, SessionMarks> = BTreeMap::new();
    for bar in bars {
        let local = to_market_time(bar.timestamp);
        let date = local.date_naive();
        let Some(day) = days.get(&date) else {
            continue;
        };
        let time = local.time();
        let entry = marks.entry(date).or_default();
        if time == day.open {
            entry.open = Some(bar.open);
        }
        if time >= day.open && time < day.close && entry.close.is_none_or(|(t, _)| time >= t) {
            entry.close = Some((time, bar.close));
        }
    }
    marks
}

/// Pairs consecutive trading days that have bars.
///
/// Bars on non-trading days are ignored. A day without an opening bar or a
/// session bar, or whose successor lacks an opening bar, is skipped with a
/// warning. The last day only supplies the previous day's `next_open`.
pub fn daily_drift(bars: &[Bar], trading_days: &[TradingDay]) -> Vec<DailyDrift> {
    let days: HashMap<NaiveDate, TradingDay> =
        trading_days.iter().map(|d| (d.date, *d)).collect();
    let marks = session_marks(bars, &days);
    let dates: Vec<&NaiveDate> = marks.keys().collect();

    let mut drifts = Vec::with_capacity(dates.len().saturating_sub(1));
    for pair in dates.windows(2) {
        let (today, tomorrow) = (*pair[0], *pair[1]);
        let Some((open, close)) = marks[&today].prices() else {
            tracing::warn!(date = %today, "no opening or session bar, skipping");
            continue;
        };
        let Some(next_open) = marks[&tomorrow].open else {
            tracing::warn!(date = %tomorrow, "no opening bar for next session, skipping");
            continue;
        };
        if open <= 0.0 || close <= 0.0 {
            tracing::warn!(date = %today, open, close, "non-positive price, skipping");
            continue;
        }

        let intraday_drift = close - open;
        let overnight_drift = next_open - close;
        drifts.push(DailyDrift {
            date: today,
            next_date: tomorrow,
            open,
            close,
            next_open,
            intraday_drift,
            overnight_drift,
            intraday_pct: intraday_drift / open * 100.0,
            overnight_pct: overnight_drift / close * 100.0,
        });
    }
    tracing::debug!(days = dates.len(), periods = drifts.len(), "computed daily drift");
    drifts
}

pub fn summarize(drifts: &[DailyDrift]) -> Result<DriftSummary, AnalysisError> {
    if drifts.is_empty() {
        return Err(AnalysisError::NoDriftPeriods);
    }
    let n = drifts.len() as f64;
    let overnight_total: f64 = drifts.iter().map(|d| d.overnight_drift).sum();
    let intraday_total: f64 = drifts.iter().map(|d| d.intraday_drift).sum();
    Ok(DriftSummary {
        periods: drifts.len(),
        overnight_total,
        overnight_avg: overnight_total / n,
        intraday_total,
        intraday_avg: intraday_total / n,
        overnight_pct_avg: drifts.iter().map(|d| d.overnight_pct).sum::<f64>() / n,
        intraday_pct_avg: drifts.iter().map(|d| d.intraday_pct).sum::<f64>() / n,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn day(d: u32, close_hour: u32) -> TradingDay {
        TradingDay {
            date: NaiveDate::from_ymd_opt(2024, 11, d).unwrap(),
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            close: NaiveTime::from_hms_opt(close_hour, 0, 0).unwrap(),
        }
    }

    // November 2024 after the DST change: New York is UTC-5.
    fn bar(d: u32, h: u32, m: u32, open: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 11, d, h + 5, m, 0).unwrap(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 100.0,
            trade_count: None,
            vwap: None,
        }
    }

    #[test]
    fn pairs_sessions_and_handles_half_day() {
        let days = [day(27, 16), day(29, 13)];
        let bars = vec![
            bar(27, 8, 0, 99.0, 99.5),
            bar(27, 9, 30, 100.0, 101.0),
            bar(27, 15, 30, 101.0, 102.0),
            bar(27, 16, 0, 102.0, 102.5),
            // Thanksgiving, not in the calendar.
            bar(28, 10, 0, 500.0, 500.0),
            bar(29, 9, 30, 103.0, 104.0),
            bar(29, 12, 30, 104.0, 105.0),
            bar(29, 13, 0, 105.0, 106.0),
        ];

        let drifts = daily_drift(&bars, &days);
        assert_eq!(drifts.len(), 1);
        let d = &drifts[0];
        assert_eq!(d.date, days[0].date);
        assert_eq!(d.next_date, days[1].date);
        assert_eq!((d.open, d.close, d.next_open), (100.0, 102.0, 103.0));
        assert_eq!(d.intraday_drift, 2.0);
        assert_eq!(d.overnight_drift, 1.0);
        assert!((d.intraday_pct - 2.0).abs() < 1e-12);
        assert!((d.overnight_pct - 100.0 / 102.0).abs() < 1e-12);
    }

    #[test]
    fn day_without_opening_bar_is_skipped() {
        let days = [day(25, 16), day(26, 16), day(27, 16)];
        let bars = vec![
            bar(25, 10, 0, 100.0, 101.0),
            bar(26, 9, 30, 101.0, 102.0),
            bar(26, 15, 30, 102.0, 103.0),
            bar(27, 9, 30, 104.0, 104.5),
        ];
        let drifts = daily_drift(&bars, &days);
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].date, days[1].date);
        assert_eq!(drifts[0].overnight_drift, 1.0);
    }

    #[test]
    fn summary_totals_and_averages() {
        let days = [day(25, 16), day(26, 16), day(27, 16)];
        let bars = vec![
            bar(25, 9, 30, 100.0, 101.0),
            bar(26, 9, 30, 102.0, 101.0),
            bar(27, 9, 30, 100.0, 100.0),
        ];
        let summary = summarize(&daily_drift(&bars, &days)).unwrap();
        assert_eq!(summary.periods, 2);
        assert_eq!(summary.intraday_total, 0.0);
        assert_eq!(summary.overnight_total, 0.0);
        assert_eq!(summary.overnight_avg, 0.0);

        assert_eq!(summarize(&[]), Err(AnalysisError::NoDriftPeriods));
    }
}
