// One analysis run: fetch, analyze, compose, render, deliver
use crate::analyzer::{Analysis, SignalAnalyzer};
use crate::chart::{ChartRenderer, SpreadChart};
use crate::config::AppConfig;
use crate::notifier::{deliver_all, Notifier};
use crate::report::Report;
use crate::source::PriceSource;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{info, warn};

/// External collaborators for a run. Absent sinks are skipped.
pub struct Sinks<'a> {
    pub chart: Option<&'a dyn ChartRenderer>,
    pub notifiers: &'a [Box<dyn Notifier>],
}

#[derive(Debug)]
pub struct RunOutcome {
    pub report: Report,
    pub chart: Option<PathBuf>,
    pub delivered: usize,
}

/// Runs the full pipeline. Every failure is folded into the report or
/// logged, so a report is always produced.
pub async fn run(
    config: &AppConfig,
    source: &dyn PriceSource,
    sinks: Sinks<'_>,
    generated_on: NaiveDate,
) -> RunOutcome {
    info!(
        "🔎 Analysing {} against {} over {}",
        config.primary_symbol, config.proxy_symbol, config.lookback
    );

    // independent fetches, joined before alignment
    let (primary, proxy) = futures::join!(
        source.fetch(&config.primary_symbol, config.lookback),
        source.fetch(&config.proxy_symbol, config.lookback)
    );
    if let Err(e) = &primary {
        warn!("⚠️ Could not fetch {}: {}", config.primary_symbol, e);
    }
    if let Err(e) = &proxy {
        warn!("⚠️ Could not fetch {}: {}", config.proxy_symbol, e);
    }

    let analyzer = SignalAnalyzer::new(config.indicator_params(), config.lead_lag_threshold);
    let analysis = analyzer.analyze(primary, proxy);
    info!("🎯 Trend: {:?} | Lead/lag: {:?}", analysis.trend, analysis.lead_lag);

    let report = Report::compose(config, &analysis, generated_on);
    let chart = sinks
        .chart
        .and_then(|renderer| render_chart(renderer, config, &analysis));

    let delivered = if sinks.notifiers.is_empty() {
        info!("ℹ️ No notification endpoint configured, report surfaced locally only");
        0
    } else {
        deliver_all(sinks.notifiers, &report.to_string(), chart.as_deref()).await
    };

    RunOutcome {
        report,
        chart,
        delivered,
    }
}

fn render_chart(
    renderer: &dyn ChartRenderer,
    config: &AppConfig,
    analysis: &Analysis,
) -> Option<PathBuf> {
    let pair = analysis.pair.value()?;
    let (Some(normalized), Some(spread)) = (pair.normalized.value(), pair.spread.value()) else {
        info!("ℹ️ No normalized series, skipping chart");
        return None;
    };
    let data = SpreadChart {
        primary_symbol: &config.primary_symbol,
        proxy_symbol: &config.proxy_symbol,
        dates: &normalized.dates,
        primary: &normalized.primary,
        proxy: &normalized.proxy,
        spread,
    };
    match renderer.render(&data) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("❌ Chart rendering failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::signals::{LeadLag, TrendSignal};
    use crate::model::{Bar, ChartError, Lookback, NotifyError, Reading, Series, SourceError};
    use crate::source::UnavailableSource;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    struct FakeSource {
        data: HashMap<String, Result<Series, SourceError>>,
    }

    #[async_trait::async_trait]
    impl PriceSource for FakeSource {
        async fn fetch(&self, symbol: &str, _lookback: Lookback) -> Result<Series, SourceError> {
            self.data
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| Err(SourceError::NotFound(symbol.to_string())))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, Option<PathBuf>)>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, text: &str, attachment: Option<&Path>) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Unreachable);
            }
            self.sent
                .lock()
                .unwrap()
                .push((text.to_string(), attachment.map(Path::to_path_buf)));
            Ok(())
        }
    }

    struct FakeChart {
        fail: bool,
    }

    impl ChartRenderer for FakeChart {
        fn render(&self, chart: &SpreadChart<'_>) -> Result<PathBuf, ChartError> {
            if self.fail {
                return Err(ChartError::Draw("boom".into()));
            }
            assert_eq!(chart.primary[0], 100.0);
            assert_eq!(chart.proxy[0], 100.0);
            Ok(PathBuf::from("fake.png"))
        }
    }

    fn series_of(closes: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Series::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar::new(start + chrono::Duration::days(i as i64), c))
                .collect(),
        )
    }

    fn source(
        primary: Result<Series, SourceError>,
        proxy: Result<Series, SourceError>,
    ) -> FakeSource {
        let config = AppConfig::default();
        FakeSource {
            data: HashMap::from([(config.primary_symbol, primary), (config.proxy_symbol, proxy)]),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn rising(n: usize, start: f64, step: f64) -> Vec<f64> {
        (0..n).map(|i| start + i as f64 * step).collect()
    }

    #[tokio::test]
    async fn test_full_run_delivers_report_and_chart() {
        let config = AppConfig::default();
        let src = source(
            Ok(series_of(&rising(40, 4.0, 0.02))),
            Ok(series_of(&rising(40, 5.0, 0.05))),
        );
        let notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(RecordingNotifier::default())];
        let chart = FakeChart { fail: false };

        let outcome = run(
            &config,
            &src,
            Sinks {
                chart: Some(&chart),
                notifiers: &notifiers,
            },
            today(),
        )
        .await;

        assert_eq!(outcome.report.trend, Reading::Value(TrendSignal::Buy));
        assert_eq!(outcome.report.lead_lag, Reading::Value(LeadLag::ProxyLeading));
        assert_eq!(outcome.chart, Some(PathBuf::from("fake.png")));
        assert_eq!(outcome.delivered, 1);
    }

    #[tokio::test]
    async fn test_empty_proxy_still_reports() {
        let config = AppConfig::default();
        let src = source(Ok(series_of(&rising(30, 40.0, -0.5))), Ok(Series::default()));
        let chart = FakeChart { fail: false };

        let outcome = run(
            &config,
            &src,
            Sinks {
                chart: Some(&chart),
                notifiers: &[],
            },
            today(),
        )
        .await;

        assert_eq!(outcome.report.trend, Reading::Value(TrendSignal::Sell));
        assert_eq!(outcome.report.lead_lag, Reading::Indeterminate);
        assert!(outcome.chart.is_none());
        assert_eq!(outcome.delivered, 0);
        assert!(outcome
            .report
            .to_string()
            .contains("could not retrieve data for YAL.AX"));
    }

    #[tokio::test]
    async fn test_sink_failures_do_not_discard_report() {
        let config = AppConfig::default();
        let src = source(
            Ok(series_of(&rising(30, 4.0, 0.01))),
            Ok(series_of(&rising(30, 5.0, 0.01))),
        );
        let notifiers: Vec<Box<dyn Notifier>> = vec![
            Box::new(RecordingNotifier {
                fail: true,
                ..Default::default()
            }),
            Box::new(RecordingNotifier::default()),
        ];
        let chart = FakeChart { fail: true };

        let outcome = run(
            &config,
            &src,
            Sinks {
                chart: Some(&chart),
                notifiers: &notifiers,
            },
            today(),
        )
        .await;

        assert!(outcome.chart.is_none());
        assert_eq!(outcome.delivered, 1);
        assert!(outcome.report.to_string().contains("**🎯 System recommendation**"));
    }

    #[tokio::test]
    async fn test_run_is_repeatable() {
        let config = AppConfig::default();
        let src = source(
            Ok(series_of(&rising(25, 4.0, 0.03))),
            Ok(series_of(&rising(25, 9.0, -0.02))),
        );
        let sinks = || Sinks {
            chart: None,
            notifiers: &[],
        };
        let first = run(&config, &src, sinks(), today()).await;
        let second = run(&config, &src, sinks(), today()).await;
        assert_eq!(first.report, second.report);
    }

    #[tokio::test]
    async fn test_unavailable_source_still_reports_both_symbols() {
        let config = AppConfig::default();
        let src = UnavailableSource::new("HTTP client unavailable");
        let notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(RecordingNotifier::default())];
        let chart = FakeChart { fail: false };

        let outcome = run(
            &config,
            &src,
            Sinks {
                chart: Some(&chart),
                notifiers: &notifiers,
            },
            today(),
        )
        .await;

        let text = outcome.report.to_string();
        assert!(text.contains("could not retrieve data for 03668.HK"));
        assert!(text.contains("could not retrieve data for YAL.AX"));
        assert_eq!(outcome.report.trend, Reading::Indeterminate);
        assert!(outcome.chart.is_none());
        assert_eq!(outcome.delivered, 1);
    }
}
