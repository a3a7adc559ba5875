use chrono::{DateTime, NaiveDate, Utc};

use crate::models::timeframe::{TimeFrame, TimeFrameError, TimeFrameUnit};

pub fn parse_timeframe(amount: u32, unit: &str) -> Result<TimeFrame, TimeFrameError> {
    let unit = match unit.trim().to_lowercase().as_str() {
        "m" | "min" | "minute" => TimeFrameUnit::Minute,
        "h" | "hr" | "hour" => TimeFrameUnit::Hour,
        "d" | "day" => TimeFrameUnit::Day,
        "w" | "wk" | "week" => TimeFrameUnit::Week,
        "mo" | "month" => TimeFrameUnit::Month,
        other => {
            return Err(TimeFrameError::InvalidInput {
                message: format!("Invalid timeframe unit: {other}"),
            });
        }
    };
    if amount == 0 {
        return Err(TimeFrameError::InvalidAmount {
            unit,
            message: "amount must be positive".to_string(),
        });
    }
    Ok(TimeFrame::new(amount, unit))
}

/// Splits a comma-separated symbol list, upper-casing and dropping blanks.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, TimeFrameError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TimeFrameError::InvalidInput {
            message: format!("`{raw}` is not an RFC 3339 timestamp: {e}"),
        })
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, TimeFrameError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| TimeFrameError::InvalidInput {
        message: format!("`{raw}` is not a YYYY-MM-DD date: {e}"),
    })
}
