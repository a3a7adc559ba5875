use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use market_data_ingestor::models::timeframe::TimeFrame;

use crate::settings::{Settings, SettingsError};

#[derive(Parser, Debug)]
#[command(
    name = "overnight-drift",
    version,
    about = "Overnight vs. intraday drift from Alpaca intraday bars"
)]
pub struct Cli {
    /// Credentials JSON with ALPACA_KEY and ALPACA_SECRET (defaults to ./config.json, then APCA_* env vars)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Settings TOML (defaults to ./overnight_drift.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Directory for charts and tables
    #[arg(long, global = true, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Bar size, e.g. 30Min, 15m, 1Hour
    #[arg(long, global = true)]
    pub timeframe: Option<TimeFrame>,

    /// Log filter, overridden by OVERNIGHT_DRIFT_LOG
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Daily drift over several years, fetched one calendar year at a time
    Drift(DriftArgs),
    /// Per-bar drift and cumulative growth for one window
    Bars(WindowArgs),
    /// Mean bar return by New York hour for one window
    Hourly(WindowArgs),
    /// Daily drift totals and averages for one window
    Summary(WindowArgs),
}

#[derive(Args, Debug)]
pub struct DriftArgs {
    #[arg(long)]
    pub ticker: Option<String>,

    /// First calendar year (inclusive)
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last calendar year (inclusive)
    #[arg(long)]
    pub end_year: Option<i32>,
}

#[derive(Args, Debug)]
pub struct WindowArgs {
    #[arg(long)]
    pub ticker: Option<String>,

    /// RFC 3339, New York local `YYYY-MM-DDTHH:MM`, or `YYYY-MM-DD` (default: 10 minutes ago)
    #[arg(long)]
    pub start: Option<String>,

    /// Same formats as --start (default: one bar after start)
    #[arg(long)]
    pub end: Option<String>,
}

impl Cli {
    /// Settings file values with command-line flags applied on top.
    pub fn resolve_settings(&self) -> Result<Settings, SettingsError> {
        let mut settings = Settings::load(self.settings.as_deref())?;
        if let Some(dir) = &self.out_dir {
            settings.out_dir = dir.clone();
        }
        if let Some(timeframe) = self.timeframe {
            settings.timeframe = timeframe;
        }

        let ticker = match &self.command {
            Command::Drift(args) => {
                if let Some(year) = args.start_year {
                    settings.start_year = year;
                }
                if let Some(year) = args.end_year {
                    settings.end_year = year;
                }
                &args.ticker
            }
            Command::Bars(args) | Command::Hourly(args) | Command::Summary(args) => &args.ticker,
        };
        if let Some(ticker) = ticker {
            settings.ticker = ticker.clone();
        }
        settings.ticker = settings.ticker.trim().to_uppercase();

        settings.validate()?;
        if matches!(self.command, Command::Drift(_) | Command::Summary(_)) {
            settings.validate_daily_timeframe()?;
        }
        Ok(settings)
    }
}
