pub mod commands;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use market_data_ingestor::providers::alpaca_rest::AlpacaProvider;
use shared_utils::config::Credentials;

pub use commands::{Cli, Command};

use crate::{
    chart,
    drift::{DailyDrift, DriftSummary, HourlyReturn, PerBarDrift, mean_pct, summarize},
    pipeline::DriftService,
    report::{self, OutputDir, SummaryReport},
    settings::Settings,
    window::TimeWindow,
};

/// Result of the `drift` and `summary` commands.
#[derive(Debug)]
pub struct DriftOutcome {
    pub report: SummaryReport,
    pub files: Vec<PathBuf>,
}

fn build_report(
    settings: &Settings,
    drifts: &[DailyDrift],
    summary: DriftSummary,
    processed: Vec<String>,
    failed: Vec<String>,
) -> SummaryReport {
    let intraday: Vec<f64> = drifts.iter().map(|d| d.intraday_pct).collect();
    let overnight: Vec<f64> = drifts.iter().map(|d| d.overnight_pct).collect();
    SummaryReport {
        ticker: settings.ticker.clone(),
        timeframe: settings.timeframe.to_string(),
        summary,
        intraday_mean_pct: mean_pct(&intraday),
        overnight_mean_pct: mean_pct(&overnight),
        windows_processed: processed,
        windows_failed: failed,
    }
}

/// Writes the daily table, the JSON summary and both daily charts.
fn write_daily_outputs(
    settings: &Settings,
    out: &OutputDir,
    drifts: &[DailyDrift],
    report: &SummaryReport,
) -> anyhow::Result<Vec<PathBuf>> {
    let table = out.file("daily_drift", "csv");
    report::write_daily_csv(&table, drifts)?;
    let json = out.file("summary", "json");
    report::write_summary_json(&json, report)?;
    let cumulative = out.file("cumulative_daily_drift", "svg");
    chart::cumulative_daily_drift_chart(&cumulative, &settings.ticker, drifts)?;
    let pct = out.file("daily_pct_change", "svg");
    chart::daily_pct_chart(&pct, drifts)?;
    Ok(vec![table, json, cumulative, pct])
}

/// Multi-year daily drift. Failing years are skipped.
pub async fn run_drift(
    service: &DriftService,
    settings: &Settings,
    out: &OutputDir,
) -> anyhow::Result<DriftOutcome> {
    let multi = service
        .multi_year_drift(&settings.ticker, settings.start_year, settings.end_year)
        .await
        .with_context(|| {
            format!(
                "no drift for {} in {}..={}",
                settings.ticker, settings.start_year, settings.end_year
            )
        })?;
    let summary = summarize(&multi.drifts)?;
    let report = build_report(
        settings,
        &multi.drifts,
        summary,
        multi.processed.iter().map(ToString::to_string).collect(),
        multi
            .failed
            .iter()
            .map(|(w, reason)| format!("{w}: {reason}"))
            .collect(),
    );
    let files = write_daily_outputs(settings, out, &multi.drifts, &report)?;
    Ok(DriftOutcome { report, files })
}

/// Daily drift totals for a single window.
pub async fn run_summary(
    service: &DriftService,
    settings: &Settings,
    window: &TimeWindow,
    out: &OutputDir,
) -> anyhow::Result<DriftOutcome> {
    let (drifts, summary) = service.summary(&settings.ticker, window).await?;
    let report = build_report(
        settings,
        &drifts,
        summary,
        vec![window.to_string()],
        Vec::new(),
    );
    let files = write_daily_outputs(settings, out, &drifts, &report)?;
    Ok(DriftOutcome { report, files })
}

pub async fn run_bars(
    service: &DriftService,
    settings: &Settings,
    window: &TimeWindow,
    out: &OutputDir,
) -> anyhow::Result<(PerBarDrift, Vec<PathBuf>)> {
    let drift = service.per_bar_drift(&settings.ticker, window).await?;
    let table = out.file("bar_drift", "csv");
    report::write_bar_drift_csv(&table, &drift)?;
    let growth = out.file("cumulative_growth", "svg");
    chart::cumulative_growth_chart(&growth, &drift)?;
    Ok((drift, vec![table, growth]))
}

pub async fn run_hourly(
    service: &DriftService,
    settings: &Settings,
    window: &TimeWindow,
    out: &OutputDir,
) -> anyhow::Result<(Vec<HourlyReturn>, Vec<PathBuf>)> {
    let hourly = service.returns_by_hour(&settings.ticker, window).await?;
    let table = out.file("returns_by_hour", "csv");
    report::write_hourly_csv(&table, &hourly)?;
    let bars = out.file("returns_by_hour", "svg");
    chart::hourly_returns_chart(&bars, &settings.ticker, &hourly)?;
    Ok((hourly, vec![table, bars]))
}

fn print_summary(report: &SummaryReport) {
    let s = &report.summary;
    println!("\nResults for {} ({}):", report.ticker, report.timeframe);
    println!("Number of periods analyzed: {}", s.periods);
    println!("\nOvernight Drift (close -> next 09:30 ET):");
    println!("Total: {:.2}", s.overnight_total);
    println!("Average: {:.4}", s.overnight_avg);
    println!("\nIntraday Drift (09:30 ET -> close):");
    println!("Total: {:.2}", s.intraday_total);
    println!("Average: {:.4}", s.intraday_avg);
    if let (Some(intraday), Some(overnight)) =
        (report.intraday_mean_pct, report.overnight_mean_pct)
    {
        println!("\n=== Combined Results ===");
        println!("Intraday Mean Drift: {intraday:.6}");
        println!("Overnight Mean Drift: {overnight:.6}");
    }
    for failed in &report.windows_failed {
        println!("Failed {failed}");
    }
}

fn print_files(files: &[PathBuf]) {
    for file in files {
        println!("wrote {}", file.display());
    }
}

/// Entry point behind `main`: settings, credentials, provider, dispatch.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.resolve_settings().context("Failed to load settings")?;
    let credentials =
        Credentials::load(cli.config.as_deref()).context("Failed to load Alpaca credentials")?;
    let provider = Arc::new(AlpacaProvider::with_config(
        &credentials,
        settings.alpaca_config(),
    )?);
    let service = DriftService::new(provider.clone(), provider, settings.timeframe)
        .with_provider_params(settings.provider_params());
    let out = OutputDir::create(&settings.out_dir, &settings.ticker)?;
    tracing::debug!(ticker = %settings.ticker, out_dir = %out.root().display(), "starting");

    let window = |args: &commands::WindowArgs| {
        TimeWindow::resolve(
            args.start.as_deref(),
            args.end.as_deref(),
            settings.timeframe,
            Utc::now(),
        )
    };

    match &cli.command {
        Command::Drift(_) => {
            let outcome = run_drift(&service, &settings, &out).await?;
            print_summary(&outcome.report);
            print_files(&outcome.files);
        }
        Command::Summary(args) => {
            let outcome = run_summary(&service, &settings, &window(args)?, &out).await?;
            print_summary(&outcome.report);
            print_files(&outcome.files);
        }
        Command::Bars(args) => {
            let (drift, files) = run_bars(&service, &settings, &window(args)?, &out).await?;
            println!(
                "{} intraday bars, {} overnight bars",
                drift.intraday.len(),
                drift.overnight.len()
            );
            if let (Some(i), Some(o)) = (drift.intraday.last(), drift.overnight.last()) {
                println!(
                    "Final growth index: intraday {:.2}, overnight {:.2}",
                    i.cumulative_growth, o.cumulative_growth
                );
            }
            print_files(&files);
        }
        Command::Hourly(args) => {
            let (hourly, files) = run_hourly(&service, &settings, &window(args)?, &out).await?;
            println!("{:>5}  {:>12}  {:>7}", "hour", "mean_ret_%", "bars");
            for h in &hourly {
                println!(
                    "{:>5}  {:>12.6}  {:>7}",
                    format!("{:02}:00", h.hour),
                    h.mean_return_pct,
                    h.samples
                );
            }
            print_files(&files);
        }
    }
    Ok(())
}
