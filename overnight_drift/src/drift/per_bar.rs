use chrono::{DateTime, TimeDelta, Utc};
use market_data_ingestor::models::bar::Bar;
use serde::Serialize;

use super::cumulative_growth;
use crate::{
    session::{Session, intraday_bars, overnight_bars},
    tz::{market_date, to_market_time},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarDrift {
    pub timestamp: DateTime<Utc>,
    /// Bar start on the New York clock, `%Y-%m-%dT%H:%M:%S%z`.
    pub local_time: String,
    pub session: Session,
    pub open: f64,
    pub close: f64,
    pub delta: f64,
    pub pct_chg: f64,
    pub cumulative_growth: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerBarDrift {
    pub intraday: Vec<BarDrift>,
    pub overnight: Vec<BarDrift>,
}

impl PerBarDrift {
    pub fn is_empty(&self) -> bool {
        self.intraday.is_empty() && self.overnight.is_empty()
    }
}

/// Whether `bar` is the first overnight bar after the hole between one
/// evening's post-market and the next morning's pre-market.
///
/// The regular session also leaves a hole in the overnight series. It does
/// not count, so the two bars must fall on different New York dates.
fn opens_new_night(prev: &Bar, bar: &Bar, bar_len: TimeDelta) -> bool {
    bar.timestamp - prev.timestamp > bar_len
        && market_date(bar.timestamp) > market_date(prev.timestamp)
}

/// Per-bar drift for each session, each indexed at 100.
///
/// Intraday bars measure `close - open` against the open. Overnight bars do
/// the same except for the first bar after a hole in overnight trading
/// (e.g. the 04:00 pre-market bar following the 20:00 post-market close),
/// which is measured from the previous overnight close so the gap is not
/// lost. The 16:00 bar after the regular session is not such a bar.
/// Overnight percentages are taken against the close.
pub fn per_bar_drift(bars: &[Bar], bar_len: TimeDelta) -> PerBarDrift {
    let intraday = intraday_bars(bars);
    let overnight = overnight_bars(bars);

    let intraday_deltas: Vec<f64> = intraday.iter().map(Bar::body).collect();
    let intraday_pcts: Vec<f64> = intraday
        .iter()
        .zip(&intraday_deltas)
        .map(|(b, d)| d / b.open * 100.0)
        .collect();

    let mut overnight_deltas = Vec::with_capacity(overnight.len());
    let mut prev: Option<&Bar> = None;
    for bar in &overnight {
        let delta = match prev {
            Some(p) if opens_new_night(p, bar, bar_len) => bar.close - p.close,
            _ => bar.body(),
        };
        overnight_deltas.push(delta);
        prev = Some(bar);
    }
    let overnight_pcts: Vec<f64> = overnight
        .iter()
        .zip(&overnight_deltas)
        .map(|(b, d)| d / b.close * 100.0)
        .collect();

    PerBarDrift {
        intraday: assemble(&intraday, Session::Intraday, &intraday_deltas, &intraday_pcts),
        overnight: assemble(&overnight, Session::Overnight, &overnight_deltas, &overnight_pcts),
    }
}

fn assemble(bars: &[Bar], session: Session, deltas: &[f64], pcts: &[f64]) -> Vec<BarDrift> {
    let growth = cumulative_growth(pcts);
    bars.iter()
        .zip(deltas)
        .zip(pcts.iter().zip(&growth))
        .map(|((bar, &delta), (&pct_chg, &cumulative_growth))| BarDrift {
            timestamp: bar.timestamp,
            local_time: to_market_time(bar.timestamp)
                .format("%Y-%m-%dT%H:%M:%S%z")
                .to_string(),
            session,
            open: bar.open,
            close: bar.close,
            delta,
            pct_chg,
            cumulative_growth,
        })
        .collect()
}
