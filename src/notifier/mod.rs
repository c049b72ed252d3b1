// Notification sinks
pub mod discord;
pub mod telegram;

use crate::model::NotifyError;
use std::path::Path;
use tracing::{info, warn};

pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Sends `text` alone, or `text` plus the attachment as one multipart payload.
    async fn deliver(&self, text: &str, attachment: Option<&Path>) -> Result<(), NotifyError>;
}

/// Delivers to every sink, single attempt each. Returns how many succeeded.
pub async fn deliver_all(
    notifiers: &[Box<dyn Notifier>],
    text: &str,
    attachment: Option<&Path>,
) -> usize {
    let mut delivered = 0;
    for notifier in notifiers {
        match notifier.deliver(text, attachment).await {
            Ok(()) => {
                info!("✅ Report delivered via {}", notifier.name());
                delivered += 1;
            }
            Err(e) => warn!("❌ {} delivery failed: {}", notifier.name(), e),
        }
    }
    delivered
}
