use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::bar::Bar;

#[derive(Deserialize, Debug)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

impl From<AlpacaBar> for Bar {
    fn from(ab: AlpacaBar) -> Self {
        Bar {
            timestamp: ab.timestamp,
            open: ab.open,
            high: ab.high,
            low: ab.low,
            close: ab.close,
            volume: ab.volume,
            trade_count: ab.trade_count,
            vwap: ab.vwap,
        }
    }
}

/// One page of `/v2/stocks/bars`. `bars` is `null` or `{}` when the window
/// holds no data.
#[derive(Deserialize, Debug)]
pub struct AlpacaResponse {
    #[serde(default)]
    pub bars: Option<IndexMap<String, Vec<AlpacaBar>>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl AlpacaResponse {
    /// True when the page carries at least one bar for any symbol.
    pub fn has_bars(&self) -> bool {
        self.bars
            .as_ref()
            .is_some_and(|m| m.values().any(|v| !v.is_empty()))
    }
}

/// One entry of `/v2/calendar`. Times are exchange-local `HH:MM`.
#[derive(Deserialize, Debug)]
pub struct AlpacaCalendarDay {
    pub date: String,
    pub open: String,
    pub close: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn decodes_page_with_token() {
        let json = r#"{
            "bars": {"SPY": [
                {"t": "2024-01-02T14:30:00Z", "o": 472.16, "h": 473.0, "l": 471.5,
                 "c": 472.8, "v": 1200345, "n": 9012, "vw": 472.4}
            ]},
            "next_page_token": "abc"
        }"#;
        let page: AlpacaResponse = serde_json::from_str(json).unwrap();
        assert!(page.has_bars());
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let bars = page.bars.unwrap();
        let bar: Bar = bars.into_values().next().unwrap().remove(0).into();
        assert_eq!(
            bar.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
        );
        assert_eq!(bar.volume, 1_200_345.0);
        assert_eq!(bar.trade_count, Some(9012));
    }

    #[test]
    fn null_bars_and_missing_token() {
        let page: AlpacaResponse =
            serde_json::from_str(r#"{"bars": null, "next_page_token": null}"#).unwrap();
        assert!(!page.has_bars());
        assert!(page.next_page_token.is_none());

        let page: AlpacaResponse = serde_json::from_str(r#"{"bars": {}}"#).unwrap();
        assert!(!page.has_bars());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let json = r#"{"t": "2024-01-02T14:30:00Z", "o": 1, "h": 2, "l": 0.5, "c": 1.5, "v": 10}"#;
        let bar: AlpacaBar = serde_json::from_str(json).unwrap();
        assert!(bar.trade_count.is_none());
        assert!(bar.vwap.is_none());
    }
}
