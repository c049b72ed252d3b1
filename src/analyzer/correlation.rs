use crate::model::{Reading, Series};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Two series reduced to their common dates.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub dates: Vec<NaiveDate>,
    pub primary: Vec<f64>,
    pub proxy: Vec<f64>,
}

/// Aligned pair rebased so that both series start at 100.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPair {
    pub dates: Vec<NaiveDate>,
    pub primary: Vec<f64>,
    pub proxy: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairAnalysis {
    pub aligned: AlignedPair,
    pub normalized: Reading<NormalizedPair>,
    pub correlation: Reading<f64>,
    /// Proxy minus primary on the normalized scale; positive means the proxy outperforms.
    pub spread: Reading<Vec<f64>>,
}

impl PairAnalysis {
    pub fn latest_spread(&self) -> Reading<f64> {
        self.spread
            .as_ref()
            .and_then(|s| s.last().copied().map_or(Reading::InsufficientData, Reading::Value))
    }
}

/// Inner join on date, ascending. Fewer than two shared dates cannot support
/// any of the downstream analytics.
pub fn align(primary: &Series, proxy: &Series) -> Reading<AlignedPair> {
    if primary.is_empty() || proxy.is_empty() {
        return Reading::InsufficientData;
    }

    let proxy_by_date: HashMap<NaiveDate, f64> =
        proxy.bars().iter().map(|b| (b.date, b.close)).collect();

    let mut aligned = AlignedPair {
        dates: Vec::new(),
        primary: Vec::new(),
        proxy: Vec::new(),
    };
    for bar in primary.bars() {
        if let Some(&proxy_close) = proxy_by_date.get(&bar.date) {
            aligned.dates.push(bar.date);
            aligned.primary.push(bar.close);
            aligned.proxy.push(proxy_close);
        }
    }

    if aligned.dates.len() < 2 {
        return Reading::InsufficientData;
    }
    Reading::Value(aligned)
}

fn rebase(values: &[f64]) -> Option<Vec<f64>> {
    let base = *values.first()?;
    if base == 0.0 || !base.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| v / base * 100.0).collect())
}

pub fn normalize(aligned: &AlignedPair) -> Reading<NormalizedPair> {
    match (rebase(&aligned.primary), rebase(&aligned.proxy)) {
        (Some(primary), Some(proxy)) => Reading::Value(NormalizedPair {
            dates: aligned.dates.clone(),
            primary,
            proxy,
        }),
        _ => Reading::Indeterminate,
    }
}

/// Pearson correlation coefficient of two equally long slices.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Reading<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return Reading::InsufficientData;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let numerator: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let var_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let var_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    if var_x == 0.0 || var_y == 0.0 {
        return Reading::Indeterminate;
    }
    Reading::Value((numerator / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

pub fn spread(normalized: &NormalizedPair) -> Vec<f64> {
    normalized
        .proxy
        .iter()
        .zip(&normalized.primary)
        .map(|(proxy, primary)| proxy - primary)
        .collect()
}

pub fn analyze_pair(primary: &Series, proxy: &Series) -> Reading<PairAnalysis> {
    align(primary, proxy).map(|aligned| {
        let normalized = normalize(&aligned);
        let correlation = pearson_correlation(&aligned.primary, &aligned.proxy);
        PairAnalysis {
            spread: normalized.as_ref().map(spread),
            aligned,
            normalized,
            correlation,
        }
    })
}
