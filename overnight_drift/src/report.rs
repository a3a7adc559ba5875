use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::drift::{DailyDrift, DriftSummary, HourlyReturn, PerBarDrift};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write CSV {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to write JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything the `drift` and `summary` commands print, in machine-readable
/// form.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub ticker: String,
    pub timeframe: String,
    pub summary: DriftSummary,
    pub intraday_mean_pct: Option<f64>,
    pub overnight_mean_pct: Option<f64>,
    pub windows_processed: Vec<String>,
    pub windows_failed: Vec<String>,
}

/// Output directory with `{ticker}_{name}` file naming.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
    ticker: String,
}

impl OutputDir {
    /// Creates the directory if needed.
    pub fn create(root: impl Into<PathBuf>, ticker: &str) -> Result<Self, ReportError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| ReportError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            ticker: ticker.to_string(),
        })
    }

    pub fn file(&self, name: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{}_{name}.{ext}", self.ticker))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), ReportError> {
    let csv_err = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote table");
    Ok(())
}

pub fn write_daily_csv(path: &Path, drifts: &[DailyDrift]) -> Result<(), ReportError> {
    write_rows(path, drifts)
}

/// Both sessions in one table, ordered by bar start.
pub fn write_bar_drift_csv(path: &Path, drift: &PerBarDrift) -> Result<(), ReportError> {
    let mut rows: Vec<_> = drift.intraday.iter().chain(&drift.overnight).collect();
    rows.sort_by_key(|b| b.timestamp);
    write_rows(path, rows)
}

pub fn write_hourly_csv(path: &Path, hourly: &[HourlyReturn]) -> Result<(), ReportError> {
    write_rows(path, hourly)
}

pub fn write_summary_json(path: &Path, report: &SummaryReport) -> Result<(), ReportError> {
    let body = serde_json::to_string_pretty(report).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, body).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote summary");
    Ok(())
}
