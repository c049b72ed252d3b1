use crate::analyzer::indicators::IndicatorParams;
use crate::model::{InvalidLookback, Lookback};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Lookback(#[from] InvalidLookback),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub primary_symbol: String,
    pub proxy_symbol: String,
    pub lookback: Lookback,
    pub ma_short: usize,
    pub ma_long: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Spread threshold in percentage points on the base-100 scale.
    pub lead_lag_threshold: f64,
    pub discord_webhook_url: Option<String>,
    pub telegram: Option<TelegramConfig>,
    /// `None` disables chart rendering.
    pub chart_path: Option<PathBuf>,
    pub chart_font_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let params = IndicatorParams::default();
        Self {
            primary_symbol: "03668.HK".into(),
            proxy_symbol: "YAL.AX".into(),
            lookback: Lookback::default(),
            ma_short: params.ma_short,
            ma_long: params.ma_long,
            macd_fast: params.macd_fast,
            macd_slow: params.macd_slow,
            macd_signal: params.macd_signal,
            lead_lag_threshold: 2.0,
            discord_webhook_url: None,
            telegram: None,
            chart_path: Some(PathBuf::from("proxy_chart.png")),
            chart_font_path: Some(PathBuf::from(DEFAULT_FONT_PATH)),
            request_timeout_secs: 15,
        }
    }
}

impl AppConfig {
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            ma_short: self.ma_short,
            ma_long: self.ma_long,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
        }
    }

    /// Applies environment-style overrides. `lookup` returns the raw value of a variable.
    ///
    /// A value that does not parse leaves its field untouched and is reported back;
    /// every other override still applies.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut errors = Vec::new();

        if let Some(v) = get("PRIMARY_SYMBOL") {
            self.primary_symbol = v;
        }
        if let Some(v) = get("PROXY_SYMBOL") {
            self.proxy_symbol = v;
        }
        if let Some(v) = get("LOOKBACK") {
            match v.parse() {
                Ok(lookback) => self.lookback = lookback,
                Err(e) => errors.push(ConfigError::from(e)),
            }
        }
        override_value(&mut self.ma_short, "MA_SHORT", get("MA_SHORT"), &mut errors);
        override_value(&mut self.ma_long, "MA_LONG", get("MA_LONG"), &mut errors);
        override_value(&mut self.macd_fast, "MACD_FAST", get("MACD_FAST"), &mut errors);
        override_value(&mut self.macd_slow, "MACD_SLOW", get("MACD_SLOW"), &mut errors);
        override_value(&mut self.macd_signal, "MACD_SIGNAL", get("MACD_SIGNAL"), &mut errors);
        override_value(
            &mut self.lead_lag_threshold,
            "LEAD_LAG_THRESHOLD",
            get("LEAD_LAG_THRESHOLD"),
            &mut errors,
        );
        if let Some(v) = get("DISCORD_WEBHOOK_URL") {
            self.discord_webhook_url = Some(v);
        }
        if let (Some(token), Some(chat)) = (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            match parse_value("TELEGRAM_CHAT_ID", &chat) {
                Ok(chat_id) => {
                    self.telegram = Some(TelegramConfig {
                        bot_token: token,
                        chat_id,
                    })
                }
                Err(e) => errors.push(e),
            }
        }
        if let Some(v) = get("CHART_PATH") {
            self.chart_path = match v.to_lowercase().as_str() {
                "none" | "off" => None,
                _ => Some(PathBuf::from(v)),
            };
        }
        if let Some(v) = get("CHART_FONT_PATH") {
            self.chart_font_path = Some(PathBuf::from(v));
        }
        override_value(
            &mut self.request_timeout_secs,
            "REQUEST_TIMEOUT_SECS",
            get("REQUEST_TIMEOUT_SECS"),
            &mut errors,
        );

        errors
    }

    /// Resets every out-of-range field to its default and reports what was reset.
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = AppConfig::default();
        let mut errors = Vec::new();

        let windows = [
            ("MA_SHORT", &mut self.ma_short, defaults.ma_short),
            ("MA_LONG", &mut self.ma_long, defaults.ma_long),
            ("MACD_FAST", &mut self.macd_fast, defaults.macd_fast),
            ("MACD_SLOW", &mut self.macd_slow, defaults.macd_slow),
            ("MACD_SIGNAL", &mut self.macd_signal, defaults.macd_signal),
        ];
        for (key, value, default) in windows {
            if *value == 0 {
                errors.push(invalid(key, *value));
                *value = default;
            }
        }
        if self.request_timeout_secs == 0 {
            errors.push(invalid("REQUEST_TIMEOUT_SECS", self.request_timeout_secs));
            self.request_timeout_secs = defaults.request_timeout_secs;
        }
        if !self.lead_lag_threshold.is_finite() || self.lead_lag_threshold < 0.0 {
            errors.push(invalid("LEAD_LAG_THRESHOLD", self.lead_lag_threshold));
            self.lead_lag_threshold = defaults.lead_lag_threshold;
        }
        if self.primary_symbol.trim().is_empty() {
            errors.push(invalid("PRIMARY_SYMBOL", &self.primary_symbol));
            self.primary_symbol = defaults.primary_symbol;
        }
        if self.proxy_symbol.trim().is_empty() {
            errors.push(invalid("PROXY_SYMBOL", &self.proxy_symbol));
            self.proxy_symbol = defaults.proxy_symbol;
        }
        errors
    }
}

fn invalid(key: &'static str, value: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| invalid(key, raw))
}

fn override_value<T: std::str::FromStr>(
    slot: &mut T,
    key: &'static str,
    raw: Option<String>,
    errors: &mut Vec<ConfigError>,
) {
    if let Some(raw) = raw {
        match parse_value(key, &raw) {
            Ok(v) => *slot = v,
            Err(e) => errors.push(e),
        }
    }
}

/// Loads the JSON config if the file exists, falling back to defaults otherwise.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// File config overlaid with `lookup`. Problems are returned alongside a usable
/// config: an unreadable file falls back to defaults, a bad value keeps the
/// field's previous setting.
pub fn load_with<F>(path: &Path, lookup: F) -> (AppConfig, Vec<ConfigError>)
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();
    let mut config = load_config(path).unwrap_or_else(|e| {
        errors.push(e);
        AppConfig::default()
    });
    errors.extend(config.apply_overrides(lookup));
    errors.extend(config.sanitize());
    (config, errors)
}

/// File config overlaid with process environment.
pub fn load_from_env() -> (AppConfig, Vec<ConfigError>) {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_with(Path::new(&path), |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.lookback, Lookback::Months(6));
        assert_eq!(cfg.indicator_params(), IndicatorParams::default());
        assert_eq!(cfg.lead_lag_threshold, 2.0);
        assert!(cfg.discord_webhook_url.is_none());
        assert!(cfg.clone().sanitize().is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        let errors = cfg.apply_overrides(lookup(&[
            ("PRIMARY_SYMBOL", "AAPL"),
            ("PROXY_SYMBOL", " QQQ "),
            ("LOOKBACK", "1y"),
            ("MA_SHORT", "10"),
            ("LEAD_LAG_THRESHOLD", "3.5"),
            ("DISCORD_WEBHOOK_URL", "https://discord.example/hook"),
            ("TELEGRAM_BOT_TOKEN", "token"),
            ("TELEGRAM_CHAT_ID", "-100123"),
            ("CHART_PATH", "none"),
        ]));
        assert!(errors.is_empty());

        assert_eq!(cfg.primary_symbol, "AAPL");
        assert_eq!(cfg.proxy_symbol, "QQQ");
        assert_eq!(cfg.lookback, Lookback::Years(1));
        assert_eq!(cfg.ma_short, 10);
        assert_eq!(cfg.lead_lag_threshold, 3.5);
        assert_eq!(cfg.discord_webhook_url.as_deref(), Some("https://discord.example/hook"));
        assert_eq!(
            cfg.telegram,
            Some(TelegramConfig {
                bot_token: "token".into(),
                chat_id: -100123
            })
        );
        assert_eq!(cfg.chart_path, None);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let mut cfg = AppConfig::default();
        assert!(cfg.apply_overrides(lookup(&[("DISCORD_WEBHOOK_URL", "  ")])).is_empty());
        assert!(cfg.discord_webhook_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut cfg = AppConfig::default();
        let errors = cfg.apply_overrides(lookup(&[("MA_LONG", "twenty")]));
        assert!(matches!(errors[..], [ConfigError::InvalidValue { key: "MA_LONG", .. }]));
        assert_eq!(cfg.ma_long, 20);

        let errors = cfg.apply_overrides(lookup(&[("LOOKBACK", "6 weeks")]));
        assert!(matches!(errors[..], [ConfigError::Lookback(_)]));
        assert_eq!(cfg.lookback, Lookback::Months(6));
    }

    #[test]
    fn test_bad_value_keeps_the_rest_of_the_config() {
        let (cfg, errors) = load_with(
            Path::new("/nonexistent/proxy-signal/config.json"),
            lookup(&[
                ("PRIMARY_SYMBOL", "0700.HK"),
                ("DISCORD_WEBHOOK_URL", "https://discord.example/hook"),
                ("TELEGRAM_BOT_TOKEN", "token"),
                ("TELEGRAM_CHAT_ID", "42"),
                ("MA_LONG", "twenty"),
            ]),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(cfg.primary_symbol, "0700.HK");
        assert_eq!(cfg.discord_webhook_url.as_deref(), Some("https://discord.example/hook"));
        assert_eq!(cfg.telegram.map(|t| t.chat_id), Some(42));
        assert_eq!(cfg.ma_long, 20);
    }

    #[test]
    fn test_sanitize_resets_only_offending_fields() {
        let mut cfg = AppConfig {
            primary_symbol: "0700.HK".into(),
            ma_short: 0,
            lead_lag_threshold: -1.0,
            ..AppConfig::default()
        };
        let errors = cfg.sanitize();
        assert_eq!(errors.len(), 2);
        assert_eq!(cfg.ma_short, 5);
        assert_eq!(cfg.lead_lag_threshold, 2.0);
        assert_eq!(cfg.primary_symbol, "0700.HK");
    }

    #[test]
    fn test_unparseable_file_falls_back_but_env_still_applies() {
        let path =
            std::env::temp_dir().join(format!("proxy_signal_cfg_{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let (cfg, errors) = load_with(&path, lookup(&[("PROXY_SYMBOL", "QQQ")]));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(errors[..], [ConfigError::Parse(_)]));
        assert_eq!(cfg.proxy_symbol, "QQQ");
        assert_eq!(cfg.primary_symbol, "03668.HK");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{ "primary_symbol": "0700.HK", "lookback": "3mo" }"#).unwrap();
        assert_eq!(cfg.primary_symbol, "0700.HK");
        assert_eq!(cfg.lookback, Lookback::Months(3));
        assert_eq!(cfg.proxy_symbol, "YAL.AX");
        assert_eq!(cfg.ma_long, 20);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = load_config(Path::new("/nonexistent/proxy-signal/config.json")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }
}
