use std::collections::BTreeMap;

use chrono::Timelike;
use market_data_ingestor::models::bar::Bar;
use serde::Serialize;

use crate::tz::to_market_time;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyReturn {
    /// Hour of the bar start, New York time.
    pub hour: u32,
    pub mean_return_pct: f64,
    pub samples: usize,
}

/// Mean `(close - open) / open * 100` per New York hour, ascending by hour.
///
/// Bars with a non-positive open carry no meaningful return and are left out.
pub fn returns_by_hour(bars: &[Bar]) -> Vec<HourlyReturn> {
    let mut buckets: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for bar in bars.iter().filter(|b| b.open > 0.0) {
        let hour = to_market_time(bar.timestamp).hour();
        let slot = buckets.entry(hour).or_default();
        slot.0 += bar.body() / bar.open * 100.0;
        slot.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(hour, (sum, samples))| HourlyReturn {
            hour,
            mean_return_pct: sum / samples as f64,
            samples,
        })
        .collect()
}
