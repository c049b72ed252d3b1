mod analyzer;
mod chart;
mod config;
mod model;
mod notifier;
mod pipeline;
mod report;
mod source;
mod utils;

use chart::{ChartRenderer, PlottersChart};
use chrono::Local;
use config::{load_from_env, AppConfig};
use notifier::{DiscordNotifier, Notifier, TelegramNotifier};
use pipeline::{run, Sinks};
use source::{PriceSource, UnavailableSource, YahooSource};
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    if dotenv::dotenv().is_ok() {
        info!("Loaded .env file");
    }

    // Bad values are reported and replaced one by one; the rest of the config stands
    let (config, problems) = load_from_env();
    for problem in &problems {
        warn!("⚠️ Config problem: {}", problem);
    }
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let source: Box<dyn PriceSource> = match YahooSource::new(timeout) {
        Ok(s) => Box::new(s),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            Box::new(UnavailableSource::new(format!("HTTP client unavailable: {}", e)))
        }
    };

    let chart = config
        .chart_path
        .clone()
        .map(|path| PlottersChart::new(path, config.chart_font_path.as_deref()));
    let notifiers = build_notifiers(&config, timeout);

    let outcome = run(
        &config,
        source.as_ref(),
        Sinks {
            chart: chart.as_ref().map(|c| c as &dyn ChartRenderer),
            notifiers: &notifiers,
        },
        Local::now().date_naive(),
    )
    .await;

    println!("{}", outcome.report);
    info!(
        "🏁 Run finished: chart={:?}, delivered to {}/{} sinks",
        outcome.chart,
        outcome.delivered,
        notifiers.len()
    );
}

/// Every configured endpoint becomes a sink; none configured means local output only.
fn build_notifiers(config: &AppConfig, timeout: Duration) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(url) = &config.discord_webhook_url {
        match DiscordNotifier::new(url.clone(), timeout) {
            Ok(n) => notifiers.push(Box::new(n)),
            Err(e) => warn!("Discord notifier disabled: {}", e),
        }
    }
    if let Some(telegram) = &config.telegram {
        match TelegramNotifier::new(telegram, timeout) {
            Ok(n) => notifiers.push(Box::new(n)),
            Err(e) => warn!("Telegram notifier disabled: {}", e),
        }
    }

    if notifiers.is_empty() {
        info!("❌ No notifier configured, the report will only be printed");
    }
    notifiers
}
