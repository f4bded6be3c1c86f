//! Outbound notification seam.

use std::path::Path;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The transport rejected or failed to deliver the message.
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    /// A file to attach could not be read.
    #[error("cannot attach {path}: {reason}")]
    Attachment { path: String, reason: String },
}

/// Destination for formatted messages and file attachments.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a text message.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Delivery`] when the transport fails.
    async fn send_text(&self, content: &str) -> Result<(), NotifyError>;

    /// Deliver a file as an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Attachment`] when the file cannot be read and
    /// [`NotifyError::Delivery`] when the transport fails.
    async fn send_file(&self, path: &Path) -> Result<(), NotifyError>;
}
