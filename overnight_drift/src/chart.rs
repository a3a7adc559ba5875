//! SVG charts of drift results.
//!
//! Every chart refuses empty input with [`ChartError::NoData`] instead of
//! writing a blank image.

use std::{
    fmt::Display,
    ops::Range,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use plotters::prelude::*;
use thiserror::Error;

use crate::drift::{BarDrift, DailyDrift, HourlyReturn, PerBarDrift, cumulative_growth};

const SIZE: (u32, u32) = (1400, 600);
const INTRADAY_COLOR: RGBColor = BLUE;
const OVERNIGHT_COLOR: RGBColor = RED;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("nothing to plot for {chart}")]
    NoData { chart: &'static str },

    #[error("failed to draw {}: {message}", path.display())]
    Draw { path: PathBuf, message: String },
}

struct Line<'a> {
    label: &'a str,
    color: RGBColor,
    points: Vec<(DateTime<Utc>, f64)>,
}

fn draw_err<E: Display>(path: &Path, e: E) -> ChartError {
    ChartError::Draw {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn padded(min: f64, max: f64) -> Range<f64> {
    let pad = ((max - min) * 0.05).max(1e-6);
    (min - pad)..(max + pad)
}

fn bounds(lines: &[Line<'_>]) -> Option<(Range<DateTime<Utc>>, Range<f64>)> {
    let mut points = lines.iter().flat_map(|l| l.points.iter());
    let &(t0, v0) = points.next()?;
    let (mut t_min, mut t_max, mut v_min, mut v_max) = (t0, t0, v0, v0);
    for &(t, v) in points {
        t_min = t_min.min(t);
        t_max = t_max.max(t);
        v_min = v_min.min(v);
        v_max = v_max.max(v);
    }
    if t_min == t_max {
        t_max = t_min + TimeDelta::days(1);
    }
    Some((t_min..t_max, padded(v_min, v_max)))
}

fn time_chart(
    path: &Path,
    chart_name: &'static str,
    title: &str,
    y_desc: &str,
    lines: &[Line<'_>],
) -> Result<(), ChartError> {
    let (x_range, y_range) = bounds(lines).ok_or(ChartError::NoData { chart: chart_name })?;

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_err(path, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| draw_err(path, e))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(y_desc)
        .x_label_formatter(&|t: &DateTime<Utc>| t.format("%Y-%m-%d").to_string())
        .draw()
        .map_err(|e| draw_err(path, e))?;

    for line in lines {
        let color = line.color;
        chart
            .draw_series(LineSeries::new(line.points.iter().copied(), color.stroke_width(2)))
            .map_err(|e| draw_err(path, e))?
            .label(line.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| draw_err(path, e))?;
    root.present().map_err(|e| draw_err(path, e))?;
    tracing::info!(path = %path.display(), chart = chart_name, "wrote chart");
    Ok(())
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn growth_line(label: &'static str, color: RGBColor, bars: &[BarDrift]) -> Line<'static> {
    Line {
        label,
        color,
        points: bars.iter().map(|b| (b.timestamp, b.cumulative_growth)).collect(),
    }
}

/// Per-bar growth indices of both sessions over time.
pub fn cumulative_growth_chart(path: &Path, drift: &PerBarDrift) -> Result<(), ChartError> {
    time_chart(
        path,
        "cumulative growth",
        "Cumulative Growth Over Time",
        "Cumulative Growth (Indexed at 100)",
        &[
            growth_line("Intraday", INTRADAY_COLOR, &drift.intraday),
            growth_line("Overnight", OVERNIGHT_COLOR, &drift.overnight),
        ],
    )
}

/// Daily intraday and overnight percentage changes.
pub fn daily_pct_chart(path: &Path, drifts: &[DailyDrift]) -> Result<(), ChartError> {
    time_chart(
        path,
        "daily percentage change",
        "Daily Percentage Change: Intraday vs. Overnight",
        "Percentage Change",
        &[
            Line {
                label: "Intraday % Change",
                color: INTRADAY_COLOR,
                points: drifts.iter().map(|d| (day_start(d.date), d.intraday_pct)).collect(),
            },
            Line {
                label: "Overnight % Change",
                color: OVERNIGHT_COLOR,
                points: drifts.iter().map(|d| (day_start(d.date), d.overnight_pct)).collect(),
            },
        ],
    )
}

/// Daily percentage changes compounded into growth indices.
pub fn cumulative_daily_drift_chart(
    path: &Path,
    ticker: &str,
    drifts: &[DailyDrift],
) -> Result<(), ChartError> {
    let mut sorted: Vec<&DailyDrift> = drifts.iter().collect();
    sorted.sort_by_key(|d| d.date);
    let dates: Vec<DateTime<Utc>> = sorted.iter().map(|d| day_start(d.date)).collect();
    let indexed = |pcts: Vec<f64>| -> Vec<(DateTime<Utc>, f64)> {
        dates.iter().copied().zip(cumulative_growth(&pcts)).collect()
    };

    time_chart(
        path,
        "cumulative daily drift",
        &format!("Cumulative Drift Over Time: Intraday vs. Overnight for {ticker}"),
        "Cumulative Growth (Indexed at 100)",
        &[
            Line {
                label: "Intraday Cumulative",
                color: INTRADAY_COLOR,
                points: indexed(sorted.iter().map(|d| d.intraday_pct).collect()),
            },
            Line {
                label: "Overnight Cumulative",
                color: OVERNIGHT_COLOR,
                points: indexed(sorted.iter().map(|d| d.overnight_pct).collect()),
            },
        ],
    )
}

/// Bar chart of mean return per New York hour.
pub fn hourly_returns_chart(
    path: &Path,
    ticker: &str,
    hourly: &[HourlyReturn],
) -> Result<(), ChartError> {
    if hourly.is_empty() {
        return Err(ChartError::NoData {
            chart: "returns by hour",
        });
    }
    let (lo, hi) = hourly.iter().fold((0.0f64, 0.0f64), |(lo, hi), h| {
        (lo.min(h.mean_return_pct), hi.max(h.mean_return_pct))
    });

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_err(path, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Average Return by Hour for {ticker}"), ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..23.5f64, padded(lo, hi))
        .map_err(|e| draw_err(path, e))?;

    chart
        .configure_mesh()
        .x_labels(24)
        .x_desc("Hour (America/New_York)")
        .y_desc("Mean Return (%)")
        .x_label_formatter(&|x: &f64| format!("{:02}", x.round() as i64))
        .draw()
        .map_err(|e| draw_err(path, e))?;

    chart
        .draw_series(hourly.iter().map(|h| {
            let x = f64::from(h.hour);
            let color = if h.mean_return_pct >= 0.0 {
                INTRADAY_COLOR
            } else {
                OVERNIGHT_COLOR
            };
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, h.mean_return_pct)], color.filled())
        }))
        .map_err(|e| draw_err(path, e))?;

    root.present().map_err(|e| draw_err(path, e))?;
    tracing::info!(path = %path.display(), chart = "returns by hour", "wrote chart");
    Ok(())
}
