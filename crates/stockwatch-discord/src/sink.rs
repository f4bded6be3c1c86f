use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use stockwatch_core::{NotificationSink, NotifyError};

use crate::client::DiscordClient;
use crate::error::DiscordError;

/// Delivers notifications to one Discord channel.
#[derive(Debug, Clone)]
pub struct DiscordSink {
    client: Arc<DiscordClient>,
    channel_id: String,
}

impl DiscordSink {
    #[must_use]
    pub fn new(client: Arc<DiscordClient>, channel_id: impl Into<String>) -> Self {
        Self {
            client,
            channel_id: channel_id.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.client
            .send_message(&self.channel_id, text)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }

    async fn send_file(&self, path: &Path) -> Result<(), NotifyError> {
        self.client
            .send_file(&self.channel_id, path)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                DiscordError::Io { path, source } => NotifyError::Attachment {
                    path: path.display().to_string(),
                    reason: source.to_string(),
                },
                other => NotifyError::Delivery(other.to_string()),
            })
    }
}
