// Yahoo Finance chart API
use crate::model::{Bar, Lookback, Series, SourceError};
use crate::source::traits::PriceSource;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
    #[serde(default)]
    adjclose: Vec<AdjCloseColumns>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumns {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

impl Indicators {
    /// Prices arrive nested per column group; collapse them into one close
    /// column, preferring the regular close and falling back to adjusted close.
    fn close_column(&self) -> Option<&[Option<f64>]> {
        let has_values = |col: &[Option<f64>]| col.iter().any(Option::is_some);
        self.quote
            .iter()
            .map(|q| q.close.as_slice())
            .chain(self.adjclose.iter().map(|a| a.adjclose.as_slice()))
            .find(|col| has_values(*col))
    }
}

pub struct YahooSource {
    client: Client,
    base_url: String,
}

impl YahooSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) ProxySignalBot/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    fn build_url(&self, symbol: &str, lookback: Lookback) -> String {
        format!(
            "{}/{}?range={}&interval=1d",
            self.base_url, symbol, lookback
        )
    }
}

#[async_trait::async_trait]
impl PriceSource for YahooSource {
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Series, SourceError> {
        let url = self.build_url(symbol, lookback);
        info!("📥 Fetching {} ({})", symbol, lookback);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(SourceError::NotFound(symbol.to_string())),
            StatusCode::TOO_MANY_REQUESTS => return Err(SourceError::RateLimited),
            s if !s.is_success() => {
                warn!("❌ Yahoo responded [{}] for {}", s, symbol);
                return Err(SourceError::Network(format!("HTTP {}", s)));
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        let series = parse_chart(&body, symbol)?;
        info!("✅ {} bars for {}", series.len(), symbol);
        Ok(series)
    }
}

fn to_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Decodes a chart response into a series, skipping rows without a close.
fn parse_chart(body: &str, symbol: &str) -> Result<Series, SourceError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(SourceError::NotFound(symbol.to_string()));
        }
        return Err(SourceError::Malformed(format!(
            "{}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or(SourceError::Empty)?;
    let closes = data.indicators.close_column().ok_or(SourceError::Empty)?;

    let bars: Vec<Bar> = data
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = (*close)?;
            Some(Bar::new(to_date(ts, data.meta.gmtoffset)?, close))
        })
        .collect();

    let series = Series::new(bars);
    if series.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(series)
}
