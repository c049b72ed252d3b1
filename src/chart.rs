// Two-panel chart: normalized closes on top, spread area below
use crate::model::ChartError;
use chrono::NaiveDate;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Aligned, base-100 data handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct SpreadChart<'a> {
    pub primary_symbol: &'a str,
    pub proxy_symbol: &'a str,
    pub dates: &'a [NaiveDate],
    pub primary: &'a [f64],
    pub proxy: &'a [f64],
    /// Proxy minus primary; non-negative values are filled green.
    pub spread: &'a [f64],
}

pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &SpreadChart<'_>) -> Result<PathBuf, ChartError>;
}

pub struct PlottersChart {
    output: PathBuf,
    size: (u32, u32),
    /// Text is only drawn when a font could be registered.
    labels: bool,
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

fn register_chart_font(path: &Path) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("⚠️ Chart font {} unavailable ({}), drawing without text", path.display(), e);
            return false;
        }
    };
    // the font registry requires 'static data; registration happens once per run
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font("sans-serif", FontStyle::Normal, bytes) {
        Ok(()) => true,
        Err(_) => {
            warn!("⚠️ Chart font {} is not a usable TTF, drawing without text", path.display());
            false
        }
    }
}

/// Min/max of the finite values, padded so flat lines stay visible.
fn padded_bounds<'a>(values: impl Iterator<Item = &'a f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo - pad, hi + pad)
}

impl PlottersChart {
    pub fn new(output: PathBuf, font_path: Option<&Path>) -> Self {
        let labels = font_path.map(register_chart_font).unwrap_or(false);
        Self {
            output,
            size: (1000, 700),
            labels,
        }
    }
}

impl ChartRenderer for PlottersChart {
    fn render(&self, chart: &SpreadChart<'_>) -> Result<PathBuf, ChartError> {
        let n = chart.spread.len();
        if n == 0 || chart.primary.len() != n || chart.proxy.len() != n {
            return Err(ChartError::NoData);
        }
        let x_range = 0..(n as i32 - 1).max(1);
        let label_area: i32 = if self.labels { 40 } else { 0 };
        let date_label = |i: &i32| {
            chart
                .dates
                .get(*i as usize)
                .map(|d| d.format("%m-%d").to_string())
                .unwrap_or_default()
        };
        let points = |values: &[f64]| -> Vec<(i32, f64)> {
            values.iter().enumerate().map(|(i, v)| (i as i32, *v)).collect()
        };

        let root = BitMapBackend::new(&self.output, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let (upper, lower) = root.split_vertically((self.size.1 * 3 / 5) as i32);

        // top: both normalized series
        let (lo, hi) = padded_bounds(chart.primary.iter().chain(chart.proxy), false);
        let mut builder = ChartBuilder::on(&upper);
        builder
            .margin(12)
            .x_label_area_size(label_area)
            .y_label_area_size(label_area + 10);
        if self.labels {
            builder.caption(
                format!("{} vs {} (base 100)", chart.primary_symbol, chart.proxy_symbol),
                ("sans-serif", 22).into_font(),
            );
        }
        let mut top = builder
            .build_cartesian_2d(x_range.clone(), lo..hi)
            .map_err(draw_err)?;
        if self.labels {
            top.configure_mesh()
                .disable_x_mesh()
                .x_label_formatter(&date_label)
                .draw()
                .map_err(draw_err)?;
        }
        top.draw_series(LineSeries::new(points(chart.primary), &BLUE))
            .map_err(draw_err)?
            .label(chart.primary_symbol)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
        top.draw_series(LineSeries::new(points(chart.proxy), &MAGENTA))
            .map_err(draw_err)?
            .label(chart.proxy_symbol)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &MAGENTA));
        if self.labels {
            top.configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        // bottom: zero-centred spread, green where the proxy leads
        let (lo, hi) = padded_bounds(chart.spread.iter(), true);
        let mut builder = ChartBuilder::on(&lower);
        builder
            .margin(12)
            .x_label_area_size(label_area)
            .y_label_area_size(label_area + 10);
        if self.labels {
            builder.caption("Spread (proxy - primary, pp)", ("sans-serif", 18).into_font());
        }
        let mut bottom = builder
            .build_cartesian_2d(x_range, lo..hi)
            .map_err(draw_err)?;
        if self.labels {
            bottom
                .configure_mesh()
                .disable_x_mesh()
                .x_label_formatter(&date_label)
                .draw()
                .map_err(draw_err)?;
        }
        let leading: Vec<(i32, f64)> = points(chart.spread)
            .into_iter()
            .map(|(i, v)| (i, v.max(0.0)))
            .collect();
        let lagging: Vec<(i32, f64)> = points(chart.spread)
            .into_iter()
            .map(|(i, v)| (i, v.min(0.0)))
            .collect();
        bottom
            .draw_series(AreaSeries::new(leading, 0.0, GREEN.mix(0.4)).border_style(&GREEN))
            .map_err(draw_err)?;
        bottom
            .draw_series(AreaSeries::new(lagging, 0.0, RED.mix(0.4)).border_style(&RED))
            .map_err(draw_err)?;
        bottom
            .draw_series(LineSeries::new(vec![(0, 0.0), ((n as i32 - 1).max(1), 0.0)], &BLACK))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        info!("🖼️ Chart written to {}", self.output.display());
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bounds() {
        let (lo, hi) = padded_bounds([100.0, 120.0].iter(), false);
        assert!(lo < 100.0 && hi > 120.0);

        let (lo, hi) = padded_bounds([3.0, 5.0].iter(), true);
        assert!(lo < 0.0 && hi > 5.0);

        assert_eq!(padded_bounds([f64::NAN].iter(), false), (-1.0, 1.0));
    }

    #[test]
    fn test_render_rejects_mismatched_input() {
        let chart = PlottersChart::new(std::env::temp_dir().join("proxy_signal_unused.png"), None);
        let data = SpreadChart {
            primary_symbol: "A",
            proxy_symbol: "B",
            dates: &[],
            primary: &[100.0],
            proxy: &[],
            spread: &[],
        };
        assert!(matches!(chart.render(&data), Err(ChartError::NoData)));
    }

    #[test]
    fn test_render_without_font_writes_png() {
        let path = std::env::temp_dir()
            .join(format!("proxy_signal_chart_{}.png", std::process::id()));
        let chart = PlottersChart::new(path.clone(), None);
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap())
            .collect();
        let data = SpreadChart {
            primary_symbol: "A",
            proxy_symbol: "B",
            dates: &dates,
            primary: &[100.0, 101.0, 99.0, 98.0],
            proxy: &[100.0, 103.0, 104.0, 97.0],
            spread: &[0.0, 2.0, 5.0, -1.0],
        };
        let written = chart.render(&data).unwrap();
        assert!(written.exists());
        let _ = std::fs::remove_file(written);
    }
}
