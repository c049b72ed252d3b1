// notifier/telegram/sender.rs

use crate::model::NotifyError;
use crate::notifier::telegram::{TelegramNotifier, MESSAGE_LIMIT};
use crate::utils::truncate_utf16;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use std::path::Path;
use tokio::time::timeout;
use tracing::{info, warn};

/// Sends a prepared request with a hard deadline and checks the API status.
async fn dispatch(
    notifier: &TelegramNotifier,
    method: &str,
    request: RequestBuilder,
) -> Result<(), NotifyError> {
    let response = match timeout(notifier.timeout, request.send()).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("❌ Telegram {}() failed: {:?}", method, e);
            return Err(NotifyError::ApiError(format!("Send failed: {}", e)));
        }
        Err(_) => {
            warn!("⏳ Telegram {}() timed out", method);
            return Err(NotifyError::Unreachable);
        }
    };
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown".into());
    if !status.is_success() {
        warn!("❌ Telegram API responded [{}]: {}", status, body);
        return Err(NotifyError::ApiError(format!("[{}] {}", status, body)));
    }
    info!("✅ Telegram {} sent [{}]", method, status);
    Ok(())
}

/// Sends a plain text message.
pub async fn send_text(notifier: &TelegramNotifier, text: &str) -> Result<(), NotifyError> {
    let params = [
        ("chat_id", notifier.chat_id.to_string()),
        ("text", truncate_utf16(text, MESSAGE_LIMIT)),
    ];
    let request = notifier
        .client
        .post(notifier.method_url("sendMessage"))
        .form(&params);
    dispatch(notifier, "sendMessage", request).await
}

/// Uploads an image, optionally captioned.
pub async fn send_photo(
    notifier: &TelegramNotifier,
    path: &Path,
    caption: Option<&str>,
) -> Result<(), NotifyError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart.png".to_string());
    let photo = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("image/png")
        .map_err(|e| NotifyError::ApiError(e.to_string()))?;

    let mut form = Form::new()
        .text("chat_id", notifier.chat_id.to_string())
        .part("photo", photo);
    if let Some(caption) = caption {
        form = form.text("caption", caption.to_string());
    }

    info!("📤 Uploading chart {} to Telegram", path.display());
    let request = notifier
        .client
        .post(notifier.method_url("sendPhoto"))
        .multipart(form);
    dispatch(notifier, "sendPhoto", request).await
}
