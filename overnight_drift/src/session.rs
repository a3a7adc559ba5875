use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use market_data_ingestor::models::bar::Bar;
use serde::Serialize;

use crate::tz::to_market_time;

/// 09:30 and 16:00 as minutes after New York midnight.
const REGULAR_OPEN_MINUTE: u32 = 9 * 60 + 30;
const REGULAR_CLOSE_MINUTE: u32 = 16 * 60;

/// Which side of the regular session a bar belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Intraday,
    Overnight,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Intraday => "intraday",
            Self::Overnight => "overnight",
        })
    }
}

/// Intraday iff the bar starts within [09:30, 16:00) New York time.
pub fn classify_at(ts: DateTime<Utc>) -> Session {
    let local = to_market_time(ts);
    let minute = local.hour() * 60 + local.minute();
    if (REGULAR_OPEN_MINUTE..REGULAR_CLOSE_MINUTE).contains(&minute) {
        Session::Intraday
    } else {
        Session::Overnight
    }
}

pub fn classify(bar: &Bar) -> Session {
    classify_at(bar.timestamp)
}

pub fn intraday_bars(bars: &[Bar]) -> Vec<Bar> {
    bars_in(bars, Session::Intraday)
}

pub fn overnight_bars(bars: &[Bar]) -> Vec<Bar> {
    bars_in(bars, Session::Overnight)
}

fn bars_in(bars: &[Bar], session: Session) -> Vec<Bar> {
    bars.iter()
        .filter(|b| classify(b) == session)
        .cloned()
        .collect()
}
