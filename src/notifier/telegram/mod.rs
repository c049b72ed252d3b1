pub mod sender;

use crate::config::TelegramConfig;
use crate::model::NotifyError;
use crate::notifier::Notifier;
use crate::utils::utf16_len;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Telegram caps photo captions at 1024 and messages at 4096 UTF-16 code units.
pub const CAPTION_LIMIT: usize = 1024;
pub const MESSAGE_LIMIT: usize = 4096;

pub struct TelegramNotifier {
    pub bot_token: String,
    pub chat_id: i64,
    pub client: Client,
    pub timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id,
            client,
            timeout,
        })
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, text).await
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, text: &str, attachment: Option<&Path>) -> Result<(), NotifyError> {
        let text = plain_text(text);
        match attachment {
            None => self.notify_text(&text).await,
            Some(path) if utf16_len(&text) <= CAPTION_LIMIT => {
                sender::send_photo(self, path, Some(&text)).await
            }
            // caption too long for a single payload: photo first, then the full text
            Some(path) => {
                sender::send_photo(self, path, None).await?;
                self.notify_text(&text).await
            }
        }
    }
}

/// Strips the Discord markdown (quote block, heading, bold, inline code);
/// messages are sent without `parse_mode`.
pub fn plain_text(report: &str) -> String {
    report
        .lines()
        .map(|line| {
            let line = line.strip_prefix(">>> ").unwrap_or(line);
            let line = line.strip_prefix("## ").unwrap_or(line);
            line.replace("**", "").replace('`', "")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let notifier = TelegramNotifier::new(
            &TelegramConfig {
                bot_token: "123:abc".into(),
                chat_id: 42,
            },
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            notifier.method_url("sendPhoto"),
            "https://api.telegram.org/bot123:abc/sendPhoto"
        );
    }

    #[test]
    fn test_plain_text_strips_discord_markup() {
        let report = ">>> ## 📈 【03668.HK monitoring report】\n\n**🎯 System recommendation**\n• Close: `$4.58`";
        assert_eq!(
            plain_text(report),
            "📈 【03668.HK monitoring report】\n\n🎯 System recommendation\n• Close: $4.58"
        );
    }
}
