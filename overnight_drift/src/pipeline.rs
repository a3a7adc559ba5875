//! Fetch-then-analyse flows behind the CLI commands.
//!
//! [`DriftService`] only talks to the [`DataProvider`] and [`TradingCalendar`]
//! traits, so tests drive it with in-memory fakes. Requests are issued one at
//! a time.

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;
use market_data_ingestor::{
    models::{
        bar::Bar,
        calendar::TradingDay,
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::TimeFrame,
    },
    providers::{DataProvider, ProviderError, TradingCalendar},
};
use thiserror::Error;

use crate::{
    drift::{
        AnalysisError, DailyDrift, DriftSummary, HourlyReturn, PerBarDrift, daily_drift,
        per_bar_drift, returns_by_hour, summarize,
    },
    tz::TimeError,
    window::{TimeWindow, year_ranges},
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("No bar data available for {ticker}")]
    NoSeries { ticker: String },
}

/// Daily drift stitched together from independently fetched years.
#[derive(Debug, Clone, Default)]
pub struct MultiYearDrift {
    pub drifts: Vec<DailyDrift>,
    pub processed: Vec<TimeWindow>,
    pub failed: Vec<(TimeWindow, String)>,
}

pub struct DriftService {
    bars: Arc<dyn DataProvider + Send + Sync>,
    calendar: Arc<dyn TradingCalendar + Send + Sync>,
    timeframe: TimeFrame,
    provider_params: ProviderParams,
}

impl DriftService {
    pub fn new(
        bars: Arc<dyn DataProvider + Send + Sync>,
        calendar: Arc<dyn TradingCalendar + Send + Sync>,
        timeframe: TimeFrame,
    ) -> Self {
        Self {
            bars,
            calendar,
            timeframe,
            provider_params: ProviderParams::None,
        }
    }

    pub fn with_provider_params(mut self, params: ProviderParams) -> Self {
        self.provider_params = params;
        self
    }

    /// All bars for `ticker` inside `window`, ascending.
    pub async fn fetch_bars(
        &self,
        ticker: &str,
        window: &TimeWindow,
    ) -> Result<Vec<Bar>, PipelineError> {
        let params = BarsRequestParams {
            symbols: vec![ticker.to_string()],
            timeframe: self.timeframe,
            start: window.start,
            end: window.end,
            provider_specific: self.provider_params.clone(),
        };
        let series = self.bars.fetch_bars(params).await?;
        let mut bars = series
            .into_iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(ticker) && !s.is_empty())
            .map(|s| s.bars)
            .ok_or_else(|| PipelineError::NoSeries {
                ticker: ticker.to_string(),
            })?;
        bars.sort_by_key(|b| b.timestamp);
        tracing::info!(%ticker, %window, bars = bars.len(), "fetched bars");
        Ok(bars)
    }

    /// Trading days for every calendar year the window touches.
    pub async fn trading_days(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<TradingDay>, PipelineError> {
        let mut days: BTreeMap<NaiveDate, TradingDay> = BTreeMap::new();
        for year in window.years() {
            let (first, last) = year_bounds(year)?;
            for day in self.calendar.trading_days(first, last).await? {
                days.insert(day.date, day);
            }
        }
        Ok(days.into_values().collect())
    }

    pub async fn daily_drift(
        &self,
        ticker: &str,
        window: &TimeWindow,
    ) -> Result<Vec<DailyDrift>, PipelineError> {
        let bars = self.fetch_bars(ticker, window).await?;
        let days = self.trading_days(window).await?;
        Ok(daily_drift(&bars, &days))
    }

    pub async fn summary(
        &self,
        ticker: &str,
        window: &TimeWindow,
    ) -> Result<(Vec<DailyDrift>, DriftSummary), PipelineError> {
        let drifts = self.daily_drift(ticker, window).await?;
        let summary = summarize(&drifts)?;
        Ok((drifts, summary))
    }

    /// Runs [`Self::daily_drift`] once per year. A failing year is logged and
    /// skipped; the run only fails when no year produced any record.
    pub async fn multi_year_drift(
        &self,
        ticker: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<MultiYearDrift, PipelineError> {
        let mut result = MultiYearDrift::default();
        for window in year_ranges(start_year, end_year)? {
            match self.daily_drift(ticker, &window).await {
                Ok(drifts) => {
                    tracing::info!(%window, periods = drifts.len(), "processed");
                    result.drifts.extend(drifts);
                    result.processed.push(window);
                }
                Err(err) => {
                    tracing::warn!(%window, error = %err, "failed, skipping");
                    result.failed.push((window, err.to_string()));
                }
            }
        }
        if result.drifts.is_empty() {
            return Err(AnalysisError::NoDriftPeriods.into());
        }
        Ok(result)
    }

    pub async fn per_bar_drift(
        &self,
        ticker: &str,
        window: &TimeWindow,
    ) -> Result<PerBarDrift, PipelineError> {
        let bars = self.fetch_bars(ticker, window).await?;
        Ok(per_bar_drift(&bars, self.timeframe.duration()))
    }

    pub async fn returns_by_hour(
        &self,
        ticker: &str,
        window: &TimeWindow,
    ) -> Result<Vec<HourlyReturn>, PipelineError> {
        let bars = self.fetch_bars(ticker, window).await?;
        Ok(returns_by_hour(&bars))
    }
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), TimeError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(TimeError::BadYear(year))?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(TimeError::BadYear(year))?;
    Ok((first, last))
}
