use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::{Backtrace, ResultExt, Snafu};

use crate::models::bar_series::BarSeries;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The output directory could not be created.
    #[snafu(display("Failed to create directory {}: {source}", path.display()))]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// A CSV record could not be written.
    #[snafu(display("Failed to write {}: {source}", path.display()))]
    Csv {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// Flushing the file failed.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait DataSink {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the paths it created, a database sink might
    /// return the number of rows inserted.
    type Output;

    /// Writes a slice of `BarSeries` to the destination.
    async fn write(&self, data: &[BarSeries]) -> Result<Self::Output, SinkError>;
}

/// Writes one CSV file per series into a directory.
///
/// Files are named `{symbol}_{timeframe}_{first}_{last}.csv` from the
/// first and last bar dates, so re-running the same window overwrites
/// instead of piling up copies.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(series: &BarSeries) -> String {
        let span = match (series.bars.first(), series.bars.last()) {
            (Some(first), Some(last)) => format!(
                "{}_{}",
                first.timestamp.format("%Y%m%d"),
                last.timestamp.format("%Y%m%d")
            ),
            _ => "empty".to_string(),
        };
        format!("{}_{}_{}.csv", series.symbol, series.timeframe, span)
    }

    fn write_series(&self, series: &BarSeries) -> Result<PathBuf, SinkError> {
        let path = self.dir.join(Self::file_name(series));
        let mut wtr = csv::Writer::from_path(&path).context(CsvSnafu { path: &path })?;
        for bar in &series.bars {
            wtr.serialize(bar).context(CsvSnafu { path: &path })?;
        }
        wtr.flush().context(IoSnafu { path: &path })?;
        Ok(path)
    }
}

#[async_trait]
impl DataSink for CsvSink {
    type Output = Vec<PathBuf>;

    async fn write(&self, data: &[BarSeries]) -> Result<Self::Output, SinkError> {
        std::fs::create_dir_all(&self.dir).context(CreateDirSnafu { path: &self.dir })?;
        let mut paths = Vec::with_capacity(data.len());
        for series in data {
            let path = self.write_series(series)?;
            tracing::info!(path = %path.display(), bars = series.len(), "wrote bars");
            paths.push(path);
        }
        Ok(paths)
    }
}
