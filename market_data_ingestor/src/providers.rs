//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching time-series bar data from any market data vendor, and the
//! [`TradingCalendar`] trait for exchange session schedules.
//!
//! Each concrete provider implementation (such as Alpaca) implements the traits to
//! handle vendor-specific API logic and validation. Both traits are async and
//! object safe, so callers can hold a `Box<dyn DataProvider + Send + Sync>` and
//! swap in an in-memory fake in tests.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{
//!     bar_series::BarSeries,
//!     request_params::BarsRequestParams,
//! };
//! use market_data_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         _params: BarsRequestParams,
//!     ) -> Result<Vec<BarSeries>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod alpaca_rest;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use shared_utils::config::ConfigError;
use snafu::{Backtrace, Snafu};

use crate::models::{
    bar_series::BarSeries, calendar::TradingDay, request_params::BarsRequestParams,
};

/// Trait for fetching time-series bar data from a market data provider.
#[async_trait]
pub trait DataProvider {
    /// Fetches time-series bar data for the given request parameters.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<BarSeries>)` - One series per symbol that returned data, in
    ///   the order the provider reported them.
    /// * `Err(ProviderError)` - If the request fails or no data is available.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

/// Trait for reading an exchange's trading calendar.
#[async_trait]
pub trait TradingCalendar {
    /// Trading days in `start..=end`, ascending.
    async fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradingDay>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// credentials could not be loaded.
    #[snafu(display("Failed to load credentials: {source}"))]
    Credentials {
        source: ConfigError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// A whole calendar year reads as the year, anything else as `start..=end`.
fn calendar_span(start: &NaiveDate, end: &NaiveDate) -> String {
    let whole_year = start.year() == end.year()
        && (start.month(), start.day()) == (1, 1)
        && (end.month(), end.day()) == (12, 31);
    if whole_year {
        start.year().to_string()
    } else {
        format!("{start}..={end}")
    }
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API answered with a non-success status.
    #[snafu(display("API request failed with status {status}: {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request succeeded but carried no bars for the requested symbols.
    #[snafu(display("No bar data available for {symbols}"))]
    NoData {
        symbols: String,
        backtrace: Backtrace,
    },

    /// The calendar endpoint returned no trading days for the range.
    #[snafu(display("No calendar data available for {}", calendar_span(start, end)))]
    EmptyCalendar {
        start: NaiveDate,
        end: NaiveDate,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use crate::models::{bar::Bar, timeframe::TimeFrame};

    use super::*;

    struct AlwaysEmpty;
    struct OneBar;

    #[async_trait]
    impl DataProvider for AlwaysEmpty {
        async fn fetch_bars(
            &self,
            params: BarsRequestParams,
        ) -> Result<Vec<BarSeries>, ProviderError> {
            NoDataSnafu {
                symbols: params.symbols.join(","),
            }
            .fail()
        }
    }

    #[async_trait]
    impl DataProvider for OneBar {
        async fn fetch_bars(
            &self,
            params: BarsRequestParams,
        ) -> Result<Vec<BarSeries>, ProviderError> {
            Ok(vec![BarSeries {
                symbol: params.symbols[0].clone(),
                timeframe: params.timeframe,
                bars: vec![Bar {
                    timestamp: params.start,
                    open: 1.0,
                    high: 2.0,
                    low: 0.5,
                    close: 1.5,
                    volume: 100.0,
                    trade_count: None,
                    vwap: None,
                }],
            }])
        }
    }

    // Decided at runtime, only possible through `Box<dyn DataProvider>`.
    fn get_provider(name: &str) -> Box<dyn DataProvider + Send + Sync> {
        if name == "fixture" {
            Box::new(OneBar)
        } else {
            Box::new(AlwaysEmpty)
        }
    }

    fn params() -> BarsRequestParams {
        BarsRequestParams::single(
            "SPY",
            TimeFrame::minutes(30),
            Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_dynamic_provider() {
        let provider = get_provider("fixture");
        let series = provider.fetch_bars(params()).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].symbol, "SPY");
        assert_eq!(series[0].bars.len(), 1);
    }

    #[test]
    fn empty_calendar_names_the_year() {
        let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        let year = EmptyCalendarSnafu {
            start: date(1, 1),
            end: date(12, 31),
        }
        .build();
        assert_eq!(year.to_string(), "No calendar data available for 2024");

        let span = EmptyCalendarSnafu {
            start: date(3, 1),
            end: date(3, 31),
        }
        .build();
        assert_eq!(
            span.to_string(),
            "No calendar data available for 2024-03-01..=2024-03-31"
        );
    }

    #[tokio::test]
    async fn no_data_error_names_symbols() {
        let provider = get_provider("empty");
        let err = provider.fetch_bars(params()).await.unwrap_err();
        assert_eq!(err.to_string(), "No bar data available for SPY");
    }
}
