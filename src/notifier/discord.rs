// Discord webhook sink
use crate::model::NotifyError;
use crate::notifier::Notifier;
use crate::utils::truncate_chars;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const CONTENT_LIMIT: usize = 2000;
const USERNAME: &str = "Proxy Signal Bot";
const AVATAR_URL: &str = "https://cdn-icons-png.flaticon.com/512/2534/2534204.png";

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
    username: &'a str,
    avatar_url: &'a str,
}

pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { webhook_url, client })
    }

    async fn attachment_part(path: &Path) -> Result<Part, NotifyError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart.png".to_string());
        Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")
            .map_err(|e| NotifyError::ApiError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn deliver(&self, text: &str, attachment: Option<&Path>) -> Result<(), NotifyError> {
        let content = truncate_chars(text, CONTENT_LIMIT);
        let payload = WebhookPayload {
            content: &content,
            username: USERNAME,
            avatar_url: AVATAR_URL,
        };

        let request = match attachment {
            None => self.client.post(&self.webhook_url).json(&payload),
            Some(path) => {
                let payload_json = serde_json::to_string(&payload)
                    .map_err(|e| NotifyError::ApiError(e.to_string()))?;
                let form = Form::new()
                    .text("payload_json", payload_json)
                    .part("files[0]", Self::attachment_part(path).await?);
                self.client.post(&self.webhook_url).multipart(form)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::ApiError(format!("Send failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            warn!("❌ Discord responded [{}]: {}", status, body);
            return Err(NotifyError::ApiError(format!("[{}] {}", status, body)));
        }
        info!("✅ Discord webhook accepted [{}]", status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload {
            content: "hello",
            username: USERNAME,
            avatar_url: AVATAR_URL,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["username"], USERNAME);
        assert!(json["avatar_url"].as_str().unwrap().starts_with("https://"));
    }

    #[tokio::test]
    async fn test_missing_attachment_is_an_error() {
        let err = DiscordNotifier::attachment_part(Path::new("/nonexistent/chart.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Attachment(_)));
    }
}
