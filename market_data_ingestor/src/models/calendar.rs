//! Exchange trading calendar entries.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One trading day with its regular-session bounds in exchange-local time
/// (America/New_York for US equities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl TradingDay {
    /// Half days (e.g. the day after Thanksgiving) close before 16:00.
    pub fn is_early_close(&self) -> bool {
        self.close < NaiveTime::MIN + chrono::TimeDelta::hours(16)
    }
}
