// Report composer: turns one analysis run into the fixed text layout
use crate::analyzer::indicators::LatestIndicators;
use crate::analyzer::returns::{cumulative_change_pct, day_change_pct};
use crate::analyzer::signals::{LeadLag, TrendSignal};
use crate::analyzer::{Analysis, Fetched};
use crate::config::AppConfig;
use crate::model::{Lookback, Reading, Series};
use crate::utils::{format_price, format_reading, format_signed_pct};
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub generated_on: NaiveDate,
    pub primary_symbol: String,
    pub proxy_symbol: String,
    pub lookback: Lookback,
    /// Set when the primary fetch failed; the technical block shows it instead of numbers.
    pub primary_failure: Option<String>,
    pub proxy_failure: Option<String>,
    pub as_of: Option<NaiveDate>,
    pub last_close: Reading<f64>,
    pub day_change_pct: Reading<f64>,
    pub ma_short_window: usize,
    pub ma_long_window: usize,
    pub ma_short: Reading<f64>,
    pub ma_long: Reading<f64>,
    pub macd_histogram: Reading<f64>,
    pub trend: Reading<TrendSignal>,
    pub proxy_day_change_pct: Reading<f64>,
    pub aligned_days: Option<usize>,
    pub correlation: Reading<f64>,
    pub spread: Reading<f64>,
    pub lead_lag: Reading<LeadLag>,
    pub primary_cumulative_pct: Reading<f64>,
    pub proxy_cumulative_pct: Reading<f64>,
}

fn failure(fetched: &Fetched) -> Option<String> {
    fetched.as_ref().err().map(|e| e.to_string())
}

/// Applies `f` to a fetched series, or reports the gap when the fetch failed.
fn on_series(fetched: &Fetched, f: impl FnOnce(&Series) -> Reading<f64>) -> Reading<f64> {
    match fetched {
        Ok(series) => f(series),
        Err(_) => Reading::InsufficientData,
    }
}

impl Report {
    pub fn compose(config: &AppConfig, analysis: &Analysis, generated_on: NaiveDate) -> Self {
        let latest = analysis.indicators.value().map(|set| set.latest());
        let from_latest = |pick: fn(&LatestIndicators) -> Option<f64>| {
            latest
                .as_ref()
                .map_or(Reading::InsufficientData, |l| Reading::from(pick(l)))
        };

        Report {
            generated_on,
            primary_symbol: config.primary_symbol.clone(),
            proxy_symbol: config.proxy_symbol.clone(),
            lookback: config.lookback,
            primary_failure: failure(&analysis.primary),
            proxy_failure: failure(&analysis.proxy),
            as_of: analysis.primary.as_ref().ok().and_then(|s| s.last()).map(|b| b.date),
            last_close: on_series(&analysis.primary, |s| {
                s.last().map_or(Reading::InsufficientData, |b| Reading::Value(b.close))
            }),
            day_change_pct: on_series(&analysis.primary, day_change_pct),
            ma_short_window: config.ma_short,
            ma_long_window: config.ma_long,
            ma_short: from_latest(|l| l.ma_short),
            ma_long: from_latest(|l| l.ma_long),
            macd_histogram: from_latest(|l| l.macd_histogram),
            trend: analysis.trend,
            proxy_day_change_pct: on_series(&analysis.proxy, day_change_pct),
            aligned_days: analysis.pair.value().map(|p| p.aligned.dates.len()),
            correlation: analysis.pair.as_ref().and_then(|p| p.correlation),
            spread: analysis.pair.as_ref().and_then(|p| p.latest_spread()),
            lead_lag: analysis.lead_lag,
            primary_cumulative_pct: on_series(&analysis.primary, cumulative_change_pct),
            proxy_cumulative_pct: on_series(&analysis.proxy, cumulative_change_pct),
        }
    }

    fn headline_emoji(&self) -> &'static str {
        match self.trend {
            Reading::Value(TrendSignal::Buy) => "🟢",
            Reading::Value(TrendSignal::Sell) => "🔴",
            Reading::Value(TrendSignal::Hold) => "⚪",
            _ => "⚠️",
        }
    }

    fn ma_operator(&self) -> &'static str {
        match (self.ma_short.value(), self.ma_long.value()) {
            (Some(s), Some(l)) if s > l => ">",
            (Some(s), Some(l)) if s < l => "<",
            (Some(_), Some(_)) => "=",
            _ => "vs",
        }
    }

    fn momentum(&self) -> String {
        format_reading(&self.macd_histogram, |h| {
            if *h > 0.0 {
                "🔼 strengthening".to_string()
            } else {
                "🔽 weakening".to_string()
            }
        })
    }

    fn recommendation(&self) -> String {
        match self.trend {
            Reading::Value(TrendSignal::Buy) => "🚀 **Strong buy signal (Buy)**".to_string(),
            Reading::Value(TrendSignal::Sell) => {
                "🔻 **Trend weakening / sell (Sell)**".to_string()
            }
            Reading::Value(TrendSignal::Hold) => "⚖️ **Wait and see (Hold)**".to_string(),
            _ if self.primary_failure.is_some() => {
                "❔ **Indeterminate** (no price data)".to_string()
            }
            _ => format!(
                "❔ **Indeterminate** (needs at least {} bars of history)",
                self.ma_long_window.max(2)
            ),
        }
    }

    fn proxy_sentiment(&self) -> String {
        format_reading(&self.proxy_day_change_pct, |pct| {
            let mood = if *pct < 0.0 {
                "🔴 sentiment weakening"
            } else {
                "🟢 sentiment strengthening"
            };
            format!("{} ({}: {:+.2}%)", mood, self.proxy_symbol, pct)
        })
    }

    fn lead_lag_label(&self) -> String {
        format_reading(&self.lead_lag, |signal| {
            let emoji = match signal {
                LeadLag::ProxyLeading => "🟢",
                LeadLag::PrimaryLeading => "🔴",
                LeadLag::Synchronized => "⚪",
            };
            format!("{} {}", emoji, signal)
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            ">>> ## {} 【{} monitoring report】",
            self.headline_emoji(),
            self.primary_symbol
        )?;
        match self.as_of {
            Some(as_of) => writeln!(f, "📅 Date: {} (as of close {})", self.generated_on, as_of)?,
            None => writeln!(f, "📅 Date: {}", self.generated_on)?,
        }
        writeln!(f)?;

        writeln!(f, "**📊 Technical indicators**")?;
        match &self.primary_failure {
            Some(reason) => writeln!(
                f,
                "⚠️ could not retrieve data for {}: {}",
                self.primary_symbol, reason
            )?,
            None => {
                writeln!(
                    f,
                    "• Close: `${}` ({} d/d)",
                    format_price(&self.last_close),
                    format_signed_pct(&self.day_change_pct)
                )?;
                writeln!(
                    f,
                    "• MA trend: `MA{}({})` {} `MA{}({})`",
                    self.ma_short_window,
                    format_price(&self.ma_short),
                    self.ma_operator(),
                    self.ma_long_window,
                    format_price(&self.ma_long)
                )?;
                writeln!(f, "• MACD momentum: {}", self.momentum())?;
            }
        }
        writeln!(f)?;

        writeln!(f, "**🎯 System recommendation**")?;
        writeln!(f, "{}", self.recommendation())?;
        writeln!(f)?;

        writeln!(f, "**⛏️ External environment ({})**", self.proxy_symbol)?;
        match &self.proxy_failure {
            Some(reason) => writeln!(
                f,
                "⚠️ could not retrieve data for {}: {}",
                self.proxy_symbol, reason
            )?,
            None => writeln!(f, "• Proxy sentiment: {}", self.proxy_sentiment())?,
        }
        if self.primary_failure.is_none()
            && self.proxy_failure.is_none()
            && self.aligned_days.is_none()
        {
            writeln!(f, "⚠️ no comparable data: fewer than 2 shared trading days")?;
        }
        match self.aligned_days {
            Some(days) => writeln!(
                f,
                "• Correlation ({} days): `{}`",
                days,
                format_reading(&self.correlation, |r| format!("{:.2}", r))
            )?,
            None => writeln!(
                f,
                "• Correlation: `{}`",
                format_reading(&self.correlation, |r| format!("{:.2}", r))
            )?,
        }
        writeln!(
            f,
            "• Lead/lag: {} (spread `{}`)",
            self.lead_lag_label(),
            format_reading(&self.spread, |s| format!("{:+.2} pp", s))
        )?;
        writeln!(
            f,
            "*(note: {} is used as a leading indicator for {})*",
            self.proxy_symbol, self.primary_symbol
        )?;
        writeln!(f)?;

        writeln!(f, "**📈 Cumulative change ({})**", self.lookback)?;
        writeln!(
            f,
            "• {}: `{}`",
            self.primary_symbol,
            format_signed_pct(&self.primary_cumulative_pct)
        )?;
        write!(
            f,
            "• {}: `{}`",
            self.proxy_symbol,
            format_signed_pct(&self.proxy_cumulative_pct)
        )
    }
}
