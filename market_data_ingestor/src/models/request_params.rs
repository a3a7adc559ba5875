use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::timeframe::TimeFrame,
    providers::alpaca_rest::params::AlpacaBarsParams,
};

/// Universal parameters for requesting time-series bar data from any market data provider.
///
/// It is the standard input for all [`DataProvider`](crate::providers::DataProvider)
/// implementations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// List of symbols to request (e.g., `["SPY"]`).
    pub symbols: Vec<String>,

    /// The time interval for each bar (e.g., 30 minutes, 1 day).
    ///
    /// **Validation of allowed values is performed by each data provider
    /// implementation, according to their own API rules.**
    pub timeframe: TimeFrame,

    /// Start of the requested time range (inclusive, UTC).
    pub start: DateTime<Utc>,

    /// End of the requested time range (UTC).
    pub end: DateTime<Utc>,

    /// Optional, provider-specific parameters.
    #[serde(default)]
    pub provider_specific: ProviderParams,
}

impl BarsRequestParams {
    /// Request for a single symbol with provider defaults.
    pub fn single(
        symbol: impl Into<String>,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbols: vec![symbol.into()],
            timeframe,
            start,
            end,
            provider_specific: ProviderParams::None,
        }
    }
}

/// An enum to hold provider-specific request parameters.
///
/// This allows callers to specify detailed, per-request options for a
/// particular provider without cluttering the universal `BarsRequestParams`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ProviderParams {
    #[default]
    None,
    Alpaca(AlpacaBarsParams),
}
