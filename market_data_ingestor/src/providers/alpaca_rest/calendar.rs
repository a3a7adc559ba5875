use chrono::{NaiveDate, NaiveTime};

use crate::{
    models::calendar::TradingDay,
    providers::{InternalSnafu, ProviderError, alpaca_rest::response::AlpacaCalendarDay},
};

fn parse_time(raw: &str, date: &str) -> Result<NaiveTime, ProviderError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H%M"))
        .map_err(|_| {
            InternalSnafu {
                message: format!("bad session time `{raw}` for {date}"),
            }
            .build()
        })
}

impl TryFrom<AlpacaCalendarDay> for TradingDay {
    type Error = ProviderError;

    fn try_from(day: AlpacaCalendarDay) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").map_err(|_| {
            InternalSnafu {
                message: format!("bad calendar date `{}`", day.date),
            }
            .build()
        })?;
        Ok(TradingDay {
            date,
            open: parse_time(&day.open, &day.date)?,
            close: parse_time(&day.close, &day.date)?,
        })
    }
}

/// Converts raw calendar entries, keeping ascending date order.
pub fn into_trading_days(raw: Vec<AlpacaCalendarDay>) -> Result<Vec<TradingDay>, ProviderError> {
    let mut days = raw
        .into_iter()
        .map(TradingDay::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    days.sort_by_key(|d| d.date);
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, open: &str, close: &str) -> AlpacaCalendarDay {
        AlpacaCalendarDay {
            date: date.into(),
            open: open.into(),
            close: close.into(),
        }
    }

    #[test]
    fn converts_and_sorts() {
        let days = into_trading_days(vec![
            raw("2024-11-29", "09:30", "13:00"),
            raw("2024-11-27", "09:30", "16:00"),
        ])
        .unwrap();
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 11, 27).unwrap());
        assert!(!days[0].is_early_close());
        assert!(days[1].is_early_close());
    }

    #[test]
    fn accepts_compact_times() {
        let day = TradingDay::try_from(raw("2024-01-02", "0930", "1600")).unwrap();
        assert_eq!(day.open, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(TradingDay::try_from(raw("01/02/2024", "09:30", "16:00")).is_err());
        assert!(TradingDay::try_from(raw("2024-01-02", "nine", "16:00")).is_err());
    }
}
