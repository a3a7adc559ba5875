//! Run settings from `overnight_drift.toml`.
//!
//! Every key is optional; missing keys keep their built-in default and CLI
//! flags override whatever the file says.
//!
//! ```toml
//! ticker = "SPY"
//! timeframe = "30Min"
//! start_year = 2017
//! end_year = 2024
//! out_dir = "out"
//!
//! [alpaca]
//! feed = "sip"
//! adjustment = "raw"
//! limit = 10000
//! max_retries = 3
//! base_delay_ms = 1000
//! ```

use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use market_data_ingestor::{
    models::{
        request_params::ProviderParams,
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::alpaca_rest::{
        AlpacaBarsParams, AlpacaConfig,
        params::{Adjustment, Feed, MAX_LIMIT},
    },
};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "overnight_drift.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub ticker: String,
    #[serde(deserialize_with = "timeframe_from_str")]
    pub timeframe: TimeFrame,
    pub start_year: i32,
    pub end_year: i32,
    pub out_dir: PathBuf,
    pub alpaca: AlpacaSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlpacaSettings {
    pub data_base_url: String,
    pub trading_base_url: String,
    pub feed: Feed,
    pub adjustment: Adjustment,
    pub limit: u32,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub requests_per_minute: NonZeroU32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ticker: "SPY".to_string(),
            timeframe: TimeFrame::minutes(30),
            start_year: 2017,
            end_year: 2024,
            out_dir: PathBuf::from("out"),
            alpaca: AlpacaSettings::default(),
        }
    }
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        let connection = AlpacaConfig::default();
        Self {
            data_base_url: connection.data_base_url,
            trading_base_url: connection.trading_base_url,
            feed: Feed::default(),
            adjustment: Adjustment::default(),
            limit: MAX_LIMIT,
            max_retries: connection.max_retries,
            base_delay_ms: connection.base_delay_ms,
            requests_per_minute: connection.requests_per_minute,
        }
    }
}

fn timeframe_from_str<'de, D: Deserializer<'de>>(d: D) -> Result<TimeFrame, D::Error> {
    let raw = String::deserialize(d)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl Settings {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// An explicit path must exist; otherwise `overnight_drift.toml` is read
    /// when present and the defaults are used when it is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_SETTINGS_FILE);
                if fallback.is_file() {
                    tracing::debug!(path = %fallback.display(), "loading settings");
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.ticker.trim().is_empty() {
            return Err(SettingsError::Invalid("ticker is empty".into()));
        }
        if self.start_year > self.end_year {
            return Err(SettingsError::Invalid(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }
        if !(1..=MAX_LIMIT).contains(&self.alpaca.limit) {
            return Err(SettingsError::Invalid(format!(
                "alpaca.limit {} outside 1..={MAX_LIMIT}",
                self.alpaca.limit
            )));
        }
        Ok(())
    }

    /// Daily drift reads the open from the bar starting at 09:30, so the bar
    /// size must be a whole number of minutes dividing 30.
    pub fn validate_daily_timeframe(&self) -> Result<(), SettingsError> {
        let tf = self.timeframe;
        if tf.unit == TimeFrameUnit::Minute && tf.amount > 0 && 30 % tf.amount == 0 {
            return Ok(());
        }
        Err(SettingsError::Invalid(format!(
            "timeframe {tf} has no bar starting at 09:30; daily drift needs 1, 2, 3, 5, 6, 10, 15 or 30 minute bars"
        )))
    }

    pub fn alpaca_config(&self) -> AlpacaConfig {
        AlpacaConfig {
            data_base_url: self.alpaca.data_base_url.clone(),
            trading_base_url: self.alpaca.trading_base_url.clone(),
            requests_per_minute: self.alpaca.requests_per_minute,
            max_retries: self.alpaca.max_retries,
            base_delay_ms: self.alpaca.base_delay_ms,
        }
    }

    pub fn provider_params(&self) -> ProviderParams {
        ProviderParams::Alpaca(AlpacaBarsParams {
            adjustment: Some(self.alpaca.adjustment),
            feed: Some(self.alpaca.feed),
            limit: Some(self.alpaca.limit),
            ..AlpacaBarsParams::default()
        })
    }
}
