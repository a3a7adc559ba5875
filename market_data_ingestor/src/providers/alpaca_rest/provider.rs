use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode, header};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use shared_utils::config::Credentials;
use snafu::ResultExt;

use crate::{
    models::{
        bar::Bar, bar_series::BarSeries, calendar::TradingDay, request_params::BarsRequestParams,
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, CredentialsSnafu, DataProvider, EmptyCalendarSnafu,
        InvalidApiKeySnafu, NoDataSnafu, ProviderError, ProviderInitError, ReqwestSnafu,
        TradingCalendar,
        alpaca_rest::{
            calendar::into_trading_days,
            params::{construct_params, validate_request},
            response::{AlpacaBar, AlpacaCalendarDay, AlpacaResponse},
        },
    },
};

pub const DATA_BASE_URL: &str = "https://data.alpaca.markets";
pub const TRADING_BASE_URL: &str = "https://paper-api.alpaca.markets";

const BARS_PATH: &str = "/v2/stocks/bars";
const CALENDAR_PATH: &str = "/v2/calendar";

/// Connection and politeness settings for [`AlpacaProvider`].
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    /// Market data host, e.g. `https://data.alpaca.markets`.
    pub data_base_url: String,
    /// Trading API host serving the calendar.
    pub trading_base_url: String,
    /// Client-side request budget.
    pub requests_per_minute: NonZeroU32,
    /// Extra attempts after a 429, a 5xx or a connect/timeout failure.
    pub max_retries: u32,
    /// Backoff before retry `n` is `base_delay_ms * 2^n`.
    pub base_delay_ms: u64,
}

impl Default for AlpacaConfig {
    fn default() -> Self {
        Self {
            data_base_url: DATA_BASE_URL.to_string(),
            trading_base_url: TRADING_BASE_URL.to_string(),
            requests_per_minute: nonzero!(200u32),
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

pub struct AlpacaProvider {
    client: Client,
    config: AlpacaConfig,
    limiter: DefaultDirectRateLimiter,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider with default hosts and limits.
    pub fn new(credentials: &Credentials) -> Result<Self, ProviderInitError> {
        Self::with_config(credentials, AlpacaConfig::default())
    }

    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        let credentials = Credentials::from_env().context(CredentialsSnafu)?;
        Self::new(&credentials)
    }

    pub fn with_config(
        credentials: &Credentials,
        config: AlpacaConfig,
    ) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(credentials.key_id().expose_secret())
                .context(InvalidApiKeySnafu)?,
        );
        let mut secret = header::HeaderValue::from_str(credentials.secret_key().expose_secret())
            .context(InvalidApiKeySnafu)?;
        secret.set_sensitive(true);
        headers.insert("APCA-API-SECRET-KEY", secret);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        let limiter = RateLimiter::direct(Quota::per_minute(config.requests_per_minute));

        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    pub fn config(&self) -> &AlpacaConfig {
        &self.config
    }

    /// GET with rate limiting and exponential backoff on retryable failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T, ProviderError> {
        let mut attempt = 0u32;
        loop {
            self.limiter.until_ready().await;

            let sent = self.client.get(url).query(query).send().await;
            let response = match sent {
                Ok(response) => response,
                Err(err)
                    if (err.is_connect() || err.is_timeout())
                        && attempt < self.config.max_retries =>
                {
                    tracing::warn!(%url, attempt, error = %err, "request failed, retrying");
                    self.backoff(attempt).await;
                    attempt += 1;
                    continue;
                }
                Err(err) => return Err(err).context(ReqwestSnafu),
            };

            let status = response.status();
            if status.is_success() {
                return response.json::<T>().await.context(ReqwestSnafu);
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.config.max_retries {
                tracing::warn!(%url, attempt, status = status.as_u16(), "retryable status");
                self.backoff(attempt).await;
                attempt += 1;
                continue;
            }

            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }
    }

    async fn backoff(&self, attempt: u32) {
        let factor = 1u64 << attempt.min(16);
        let delay = self.config.base_delay_ms.saturating_mul(factor);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        validate_request(&params)?;

        let url = format!("{}{}", self.config.data_base_url, BARS_PATH);
        let base_query = construct_params(&params);
        let mut all_bars: IndexMap<String, Vec<AlpacaBar>> = IndexMap::new();
        let mut next_page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query_params = base_query.clone();
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            let page: AlpacaResponse = self.get_json(&url, &query_params).await?;
            pages += 1;

            if !page.has_bars() {
                if all_bars.is_empty() {
                    return NoDataSnafu {
                        symbols: params.symbols.join(","),
                    }
                    .fail();
                }
                break;
            }

            // Merge the bars from the current page into our collection.
            for (symbol, bars) in page.bars.into_iter().flatten() {
                all_bars.entry(symbol).or_default().extend(bars);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }

        let total: usize = all_bars.values().map(Vec::len).sum();
        tracing::debug!(
            symbols = %params.symbols.join(","),
            timeframe = %params.timeframe,
            pages,
            bars = total,
            "fetched bars"
        );

        let result = all_bars
            .into_iter()
            .filter(|(_, bars)| !bars.is_empty())
            .map(|(symbol, alpaca_bars)| BarSeries {
                symbol,
                timeframe: params.timeframe,
                bars: alpaca_bars.into_iter().map(Bar::from).collect(),
            })
            .collect();

        Ok(result)
    }
}

#[async_trait]
impl TradingCalendar for AlpacaProvider {
    async fn trading_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TradingDay>, ProviderError> {
        let url = format!("{}{}", self.config.trading_base_url, CALENDAR_PATH);
        let query = vec![
            ("start".to_string(), start.format("%Y-%m-%d").to_string()),
            ("end".to_string(), end.format("%Y-%m-%d").to_string()),
        ];
        let raw: Vec<AlpacaCalendarDay> = self.get_json(&url, &query).await?;
        if raw.is_empty() {
            return EmptyCalendarSnafu { start, end }.fail();
        }
        let days = into_trading_days(raw)?;
        tracing::debug!(%start, %end, days = days.len(), "fetched trading calendar");
        Ok(days)
    }
}
