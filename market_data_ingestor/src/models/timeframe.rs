use std::{fmt, str::FromStr};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// Bar interval as `amount × unit`.
///
/// Construction is unchecked; each provider validates the combinations its
/// API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub const fn new(amount: u32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn minutes(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    pub const fn hours(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Hour)
    }

    pub const fn day() -> Self {
        Self::new(1, TimeFrameUnit::Day)
    }

    /// Nominal length of one bar. Months count as 30 days.
    pub fn duration(&self) -> TimeDelta {
        let amount = i64::from(self.amount);
        match self.unit {
            TimeFrameUnit::Minute => TimeDelta::minutes(amount),
            TimeFrameUnit::Hour => TimeDelta::hours(amount),
            TimeFrameUnit::Day => TimeDelta::days(amount),
            TimeFrameUnit::Week => TimeDelta::weeks(amount),
            TimeFrameUnit::Month => TimeDelta::days(30 * amount),
        }
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::minutes(30)
    }
}

/// Alpaca wire form: `30Min`, `1Hour`, `1Day`, `1Week`, `1Month`.
impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeFrameUnit::Minute => "Min",
            TimeFrameUnit::Hour => "Hour",
            TimeFrameUnit::Day => "Day",
            TimeFrameUnit::Week => "Week",
            TimeFrameUnit::Month => "Month",
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

/// Accepts the Alpaca wire form (`30Min`) and the short CLI form
/// (`30m`, `1h`, `1D`, `1W`, `1M`).
impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeFrameError::InvalidInput {
                message: format!("timeframe `{s}` has no unit"),
            })?;
        let (digits, unit) = s.split_at(split);
        let amount: u32 = digits.parse().map_err(|_| TimeFrameError::InvalidInput {
            message: format!("timeframe `{s}` has no amount"),
        })?;
        let unit = match unit {
            "m" | "Min" | "min" | "T" => TimeFrameUnit::Minute,
            "h" | "H" | "Hour" | "hour" => TimeFrameUnit::Hour,
            "D" | "d" | "Day" | "day" => TimeFrameUnit::Day,
            "W" | "w" | "Week" | "week" => TimeFrameUnit::Week,
            "M" | "Month" | "month" | "mo" => TimeFrameUnit::Month,
            other => {
                return Err(TimeFrameError::InvalidInput {
                    message: format!("unknown timeframe unit `{other}`"),
                });
            }
        };
        Ok(Self::new(amount, unit))
    }
}
