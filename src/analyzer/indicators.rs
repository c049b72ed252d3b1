use crate::model::{Reading, Series};
use chrono::NaiveDate;

/// Indicator line aligned to source dates; `None` where the window has not filled.
pub type Line = Vec<Option<f64>>;

/// Window and span settings for the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub ma_short: usize,
    pub ma_long: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_short: 5,
            ma_long: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub dates: Vec<NaiveDate>,
    pub ma_short: Line,
    pub ma_long: Line,
    pub macd_line: Line,
    pub macd_signal: Line,
    pub macd_histogram: Line,
}

/// Latest entry of each line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestIndicators {
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub macd_histogram: Option<f64>,
}

impl IndicatorSet {
    pub fn latest(&self) -> LatestIndicators {
        let last = |line: &Line| line.last().copied().flatten();
        LatestIndicators {
            ma_short: last(&self.ma_short),
            ma_long: last(&self.ma_long),
            macd_histogram: last(&self.macd_histogram),
        }
    }
}

/// Rolling arithmetic mean over `window` closes. Each defined entry is the
/// plain mean of its own window, so no drift accumulates along the series.
pub fn simple_moving_average(closes: &[f64], window: usize) -> Line {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() < window {
        return out;
    }
    for (i, w) in closes.windows(window).enumerate() {
        out[i + window - 1] = Some(w.iter().sum::<f64>() / window as f64);
    }
    out
}

/// Recursive EWMA with `alpha = 2 / (span + 1)`, seeded by the first value.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal);
    let histogram = line.iter().zip(&signal_line).map(|(l, s)| l - s).collect();
    Macd {
        line,
        signal: signal_line,
        histogram,
    }
}

/// Computes the full indicator set for a series. Fewer than two bars cannot
/// carry a trend, so the whole set is reported as insufficient.
pub fn compute_indicators(series: &Series, params: &IndicatorParams) -> Reading<IndicatorSet> {
    if series.len() < 2 {
        return Reading::InsufficientData;
    }

    let closes = series.closes();
    let macd = macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
    let defined = |v: Vec<f64>| -> Line { v.into_iter().map(Some).collect() };

    Reading::Value(IndicatorSet {
        dates: series.dates(),
        ma_short: simple_moving_average(&closes, params.ma_short),
        ma_long: simple_moving_average(&closes, params.ma_long),
        macd_line: defined(macd.line),
        macd_signal: defined(macd.signal),
        macd_histogram: defined(macd.histogram),
    })
}
