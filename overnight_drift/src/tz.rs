//! Exchange time zone helpers.
//!
//! Bars arrive stamped in UTC, while sessions, calendar dates and user input
//! are expressed in New York wall-clock time. Local times are only accepted at
//! the CLI edge. Times inside a spring-forward gap shift forward to the first
//! valid minute and fall-back repeats resolve to the earlier instant.
//!
//! Examples
//! - `2024-03-10 02:30` does not exist in New York and gives 07:00Z.
//! - `2024-11-03 01:30` occurs twice and gives 05:30Z (the EDT reading).

use chrono::{DateTime, MappedLocalTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Time zone of the US equity exchanges.
pub const MARKET_TZ: Tz = chrono_tz::America::New_York;

/// Longest DST gap we step across before giving up.
const MAX_GAP_MINUTES: u32 = 120;

#[derive(Debug, Error)]
pub enum TimeError {
    #[error("`{input}` is not a recognised timestamp (RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD`)")]
    Unparseable { input: String },

    #[error("local time {naive} does not exist in {tz}")]
    Nonexistent { naive: NaiveDateTime, tz: Tz },

    #[error("window start {start} is not before end {end}")]
    EmptyWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("year {0} is out of range")]
    BadYear(i32),
}

/// Converts a naive wall-clock time in `tz` to UTC.
pub fn from_local_naive(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, TimeError> {
    match tz.from_local_datetime(&naive) {
        MappedLocalTime::Single(dt) => Ok(dt.with_timezone(&Utc)),
        MappedLocalTime::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        MappedLocalTime::None => {
            let mut t = naive;
            for _ in 0..MAX_GAP_MINUTES {
                t += TimeDelta::minutes(1);
                if let MappedLocalTime::Single(dt) = tz.from_local_datetime(&t) {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
            Err(TimeError::Nonexistent { naive, tz })
        }
    }
}

/// Midnight of `date` in New York, as UTC.
pub fn market_midnight(date: NaiveDate) -> Result<DateTime<Utc>, TimeError> {
    from_local_naive(date.and_time(chrono::NaiveTime::MIN), MARKET_TZ)
}

/// The instant viewed on the exchange clock.
pub fn to_market_time(ts: DateTime<Utc>) -> DateTime<Tz> {
    ts.with_timezone(&MARKET_TZ)
}

/// New York calendar date the instant falls on.
pub fn market_date(ts: DateTime<Utc>) -> NaiveDate {
    to_market_time(ts).date_naive()
}
