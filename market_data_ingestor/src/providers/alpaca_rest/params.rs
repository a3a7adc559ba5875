use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Largest page size the bars endpoint accepts.
pub const MAX_LIMIT: u32 = 10_000;

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

impl Adjustment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Split => "split",
            Self::Dividend => "dividend",
            Self::All => "all",
        }
    }
}

/// Specifies the source feed for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Iex => "iex",
            Self::Otc => "otc",
        }
    }
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Alpaca-specific parameters for a bars request.
///
/// Unset fields fall back to `adjustment=raw`, `feed=sip`, `sort=asc` and
/// the maximum page size.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AlpacaBarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

/// Checks a timeframe against the combinations the bars endpoint accepts.
pub fn validate_timeframe(tf: &TimeFrame) -> Result<(), ProviderError> {
    let ok = match tf.unit {
        TimeFrameUnit::Minute => (1..=59).contains(&tf.amount),
        TimeFrameUnit::Hour => (1..=23).contains(&tf.amount),
        TimeFrameUnit::Day | TimeFrameUnit::Week => tf.amount == 1,
        TimeFrameUnit::Month => [1, 2, 3, 6, 12].contains(&tf.amount),
    };
    if ok {
        Ok(())
    } else {
        ValidationSnafu {
            message: format!("unsupported timeframe {tf}"),
        }
        .fail()
    }
}

/// Checks everything about a request that does not need the network.
pub fn validate_request(params: &BarsRequestParams) -> Result<(), ProviderError> {
    validate_timeframe(&params.timeframe)?;
    if params.symbols.is_empty() || params.symbols.iter().any(|s| s.trim().is_empty()) {
        return ValidationSnafu {
            message: "at least one non-empty symbol is required",
        }
        .fail();
    }
    if params.start >= params.end {
        return ValidationSnafu {
            message: format!("start {} is not before end {}", params.start, params.end),
        }
        .fail();
    }
    if let ProviderParams::Alpaca(AlpacaBarsParams {
        limit: Some(limit), ..
    }) = &params.provider_specific
    {
        if *limit == 0 || *limit > MAX_LIMIT {
            return ValidationSnafu {
                message: format!("limit {limit} outside 1..={MAX_LIMIT}"),
            }
            .fail();
        }
    }
    Ok(())
}

/// Timestamps are sent truncated to the minute.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:00Z").to_string()
}

/// Builds the query string for the first page of a bars request.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(String, String)> {
    let alpaca = match &params.provider_specific {
        ProviderParams::Alpaca(p) => p.clone(),
        ProviderParams::None => AlpacaBarsParams::default(),
    };

    let mut query = vec![
        ("symbols".to_string(), params.symbols.join(",")),
        ("timeframe".to_string(), params.timeframe.to_string()),
        ("start".to_string(), format_timestamp(&params.start)),
        ("end".to_string(), format_timestamp(&params.end)),
        (
            "limit".to_string(),
            alpaca.limit.unwrap_or(MAX_LIMIT).to_string(),
        ),
        (
            "adjustment".to_string(),
            alpaca.adjustment.unwrap_or_default().as_str().to_string(),
        ),
        (
            "feed".to_string(),
            alpaca.feed.unwrap_or_default().as_str().to_string(),
        ),
        (
            "sort".to_string(),
            alpaca.sort.unwrap_or_default().as_str().to_string(),
        ),
    ];
    if let Some(currency) = alpaca.currency {
        query.push(("currency".to_string(), currency));
    }
    query
}
