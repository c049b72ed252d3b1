// Analyzer module: indicator engine, pair alignment/correlation and signal classification.

pub mod correlation;
pub mod indicators;
pub mod returns;
pub mod signals;

use crate::model::{Reading, Series, SourceError};
use correlation::{analyze_pair, PairAnalysis};
use indicators::{compute_indicators, IndicatorParams, IndicatorSet};
use signals::{classify_lead_lag, classify_trend, LeadLag, TrendSignal};

/// Fetch outcome for one symbol.
pub type Fetched = Result<Series, SourceError>;

/// Everything derived from one pair of fetches.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub primary: Fetched,
    pub proxy: Fetched,
    pub indicators: Reading<IndicatorSet>,
    pub pair: Reading<PairAnalysis>,
    pub trend: Reading<TrendSignal>,
    pub lead_lag: Reading<LeadLag>,
}

/// Pure numeric core: no I/O, no hidden state.
pub struct SignalAnalyzer {
    params: IndicatorParams,
    lead_lag_threshold: f64,
}

impl SignalAnalyzer {
    pub fn new(params: IndicatorParams, lead_lag_threshold: f64) -> Self {
        Self {
            params,
            lead_lag_threshold,
        }
    }

    pub fn analyze(&self, primary: Fetched, proxy: Fetched) -> Analysis {
        let primary = reject_empty(primary);
        let proxy = reject_empty(proxy);

        // a failed fetch stops the pipeline for that series
        let indicators = match &primary {
            Ok(series) => compute_indicators(series, &self.params),
            Err(_) => Reading::InsufficientData,
        };
        let pair = match (&primary, &proxy) {
            (Ok(p), Ok(x)) => analyze_pair(p, x),
            _ => Reading::InsufficientData,
        };
        let trend = classify_trend(&indicators);
        let lead_lag = classify_lead_lag(&pair, self.lead_lag_threshold);

        Analysis {
            primary,
            proxy,
            indicators,
            pair,
            trend,
            lead_lag,
        }
    }
}

fn reject_empty(fetched: Fetched) -> Fetched {
    match fetched {
        Ok(series) if series.is_empty() => Err(SourceError::Empty),
        other => other,
    }
}
