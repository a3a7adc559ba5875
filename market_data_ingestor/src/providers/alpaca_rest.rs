//! Alpaca REST adapter: historical stock bars (`/v2/stocks/bars`) and the
//! trading calendar (`/v2/calendar`).

pub mod calendar;
pub mod params;
pub mod provider;
pub mod response;

pub use params::AlpacaBarsParams;
pub use provider::{AlpacaConfig, AlpacaProvider};
