//! Overnight and intraday drift analytics.
//!
//! Everything here is a pure function over in-memory bars, so the same code
//! serves the CLI, the reports and the property tests:
//! - [`daily_drift`] pairs each trading day's close with the next day's open.
//! - [`summarize`] totals and averages a run of daily records.
//! - [`per_bar_drift`] splits bars by session and indexes each side at 100.
//! - [`returns_by_hour`] averages bar returns per New York hour.

mod daily;
mod hourly;
mod per_bar;

pub use daily::{DailyDrift, DriftSummary, daily_drift, summarize};
pub use hourly::{HourlyReturn, returns_by_hour};
pub use per_bar::{BarDrift, PerBarDrift, per_bar_drift};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("No valid drift periods found")]
    NoDriftPeriods,
}

/// Growth index starting at 100.
///
/// `g[0] = 100` and `g[i] = g[i-1] * (1 + pct[i] / 100)`; the first change is
/// treated as the base period and not applied.
pub fn cumulative_growth(pcts: &[f64]) -> Vec<f64> {
    let mut growth = Vec::with_capacity(pcts.len());
    let mut level = 100.0;
    for (i, pct) in pcts.iter().enumerate() {
        if i > 0 {
            level *= 1.0 + pct / 100.0;
        }
        growth.push(level);
    }
    growth
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean_pct(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
