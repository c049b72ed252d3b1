use crate::model::{Reading, Series};

/// Percent change from `from` to `to`. Undefined for a zero base.
pub fn percent_change(from: f64, to: f64) -> Reading<f64> {
    if from == 0.0 || !from.is_finite() || !to.is_finite() {
        return Reading::Indeterminate;
    }
    Reading::Value((to - from) / from * 100.0)
}

/// Change of the latest close against the previous bar.
pub fn day_change_pct(series: &Series) -> Reading<f64> {
    match series.bars() {
        [.., prev, last] => percent_change(prev.close, last.close),
        _ => Reading::InsufficientData,
    }
}

/// Change from the first to the last close of the window.
pub fn cumulative_change_pct(series: &Series) -> Reading<f64> {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= 2 => percent_change(first.close, last.close),
        _ => Reading::InsufficientData,
    }
}
