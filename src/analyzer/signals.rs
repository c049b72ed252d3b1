use crate::analyzer::correlation::PairAnalysis;
use crate::analyzer::indicators::IndicatorSet;
use crate::model::Reading;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendSignal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadLag {
    ProxyLeading,
    PrimaryLeading,
    Synchronized,
}

impl fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendSignal::Buy => write!(f, "Buy"),
            TrendSignal::Sell => write!(f, "Sell"),
            TrendSignal::Hold => write!(f, "Hold"),
        }
    }
}

impl fmt::Display for LeadLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadLag::ProxyLeading => write!(f, "Proxy leading"),
            LeadLag::PrimaryLeading => write!(f, "Primary leading"),
            LeadLag::Synchronized => write!(f, "Synchronized"),
        }
    }
}

/// Trend call on the latest bar. `Sell` needs a strict `ma_short < ma_long`,
/// so an exact tie lands on `Hold`.
pub fn classify_trend(indicators: &Reading<IndicatorSet>) -> Reading<TrendSignal> {
    let Some(set) = indicators.value() else {
        return Reading::Indeterminate;
    };
    let latest = set.latest();
    let (Some(short), Some(long), Some(hist)) =
        (latest.ma_short, latest.ma_long, latest.macd_histogram)
    else {
        return Reading::Indeterminate;
    };

    let signal = if short > long && hist > 0.0 {
        TrendSignal::Buy
    } else if short < long {
        TrendSignal::Sell
    } else {
        TrendSignal::Hold
    };
    Reading::Value(signal)
}

pub fn classify_spread(spread: f64, threshold: f64) -> LeadLag {
    if spread > threshold {
        LeadLag::ProxyLeading
    } else if spread < -threshold {
        LeadLag::PrimaryLeading
    } else {
        LeadLag::Synchronized
    }
}

/// Lead/lag call on the latest spread value.
pub fn classify_lead_lag(pair: &Reading<PairAnalysis>, threshold: f64) -> Reading<LeadLag> {
    match pair.as_ref().and_then(PairAnalysis::latest_spread) {
        Reading::Value(spread) if spread.is_finite() => {
            Reading::Value(classify_spread(spread, threshold))
        }
        _ => Reading::Indeterminate,
    }
}
