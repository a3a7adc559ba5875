use anyhow::{Context, bail};
use clap::Parser;
use market_data_ingestor::{
    cli::{
        commands::{Cli, Commands},
        params::{parse_date, parse_datetime, parse_symbols, parse_timeframe},
    },
    io::sink::{CsvSink, DataSink},
    models::request_params::{BarsRequestParams, ProviderParams},
    providers::{DataProvider, TradingCalendar, alpaca_rest::AlpacaProvider},
};
use shared_utils::config::Credentials;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let credentials =
        Credentials::load(cli.config.as_deref()).context("Failed to load Alpaca credentials")?;
    let provider = AlpacaProvider::new(&credentials)?;

    match cli.command {
        Commands::Single {
            symbols,
            amount,
            unit,
            start,
            end,
            out_dir,
        } => {
            let symbols = parse_symbols(&symbols);
            if symbols.is_empty() {
                bail!("--symbols must name at least one ticker");
            }
            let params = BarsRequestParams {
                symbols,
                timeframe: parse_timeframe(amount, &unit)?,
                start: parse_datetime(&start)?,
                end: parse_datetime(&end)?,
                provider_specific: ProviderParams::None,
            };

            let series = provider.fetch_bars(params).await?;
            let paths = CsvSink::new(out_dir).write(&series).await?;
            for path in paths {
                println!("{}", path.display());
            }
        }
        Commands::Calendar { start, end } => {
            let days = provider
                .trading_days(parse_date(&start)?, parse_date(&end)?)
                .await?;
            for day in days {
                let marker = if day.is_early_close() { " (early close)" } else { "" };
                println!(
                    "{} {}-{}{}",
                    day.date,
                    day.open.format("%H:%M"),
                    day.close.format("%H:%M"),
                    marker
                );
            }
        }
    }

    Ok(())
}
