use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a JSON credentials file (defaults to ./config.json, then the environment)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch bars for one window and write them as CSV
    Single {
        /// Comma-separated list of symbols (e.g. "SPY,QQQ")
        #[arg(long)]
        symbols: String,

        /// Timeframe amount (numeric value)
        #[arg(long, default_value = "30")]
        amount: u32,

        /// Timeframe unit: m (minute), h (hour), d (day), w (week), mo (month)
        #[arg(long, default_value = "m")]
        unit: String,

        /// Start datetime in RFC 3339 format (e.g. "2024-01-02T14:30:00Z")
        #[arg(long)]
        start: String,

        /// End datetime in RFC 3339 format (e.g. "2024-01-31T21:00:00Z")
        #[arg(short, long)]
        end: String,

        /// Directory the CSV files are written to
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },

    /// Print the trading calendar for a date range
    Calendar {
        /// First date, YYYY-MM-DD
        #[arg(long)]
        start: String,

        /// Last date, YYYY-MM-DD
        #[arg(long)]
        end: String,
    },
}
