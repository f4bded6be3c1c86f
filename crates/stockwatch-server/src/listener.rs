//! Inbound chat commands.
//!
//! The listener polls the notification channel and answers a handful of
//! exact-match commands. It shares nothing with the cycle loop except the
//! sink and file paths, so it keeps answering while a cycle is settling.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stockwatch_core::{NotificationSink, NotifyError};
use stockwatch_discord::{DiscordClient, DiscordError, Message};

/// Recognized commands. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Pong,
    /// Attach the ledger file.
    Csv,
    /// Attach the latest debug screenshot.
    Debug,
}

impl Command {
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        match content {
            "ping" => Some(Self::Ping),
            "pong" => Some(Self::Pong),
            "!csv" => Some(Self::Csv),
            "!debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

/// Executes commands against the sink.
pub struct CommandHandler {
    sink: Arc<dyn NotificationSink>,
    ledger_path: PathBuf,
    /// `Some` only when debug screenshots are enabled.
    debug_screenshot: Option<PathBuf>,
}

impl CommandHandler {
    #[must_use]
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        ledger_path: PathBuf,
        debug_screenshot: Option<PathBuf>,
    ) -> Self {
        Self {
            sink,
            ledger_path,
            debug_screenshot,
        }
    }

    /// # Errors
    ///
    /// Returns the sink's error when the reply cannot be delivered.
    pub async fn handle(&self, command: Command) -> Result<(), NotifyError> {
        match command {
            Command::Ping => self.sink.send_text("pong").await,
            Command::Pong => self.sink.send_text("ping").await,
            Command::Csv => self.sink.send_file(&self.ledger_path).await,
            Command::Debug => {
                let Some(path) = &self.debug_screenshot else {
                    tracing::debug!("listener: !debug ignored; DEBUG is off");
                    return Ok(());
                };
                if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                    tracing::info!(path = %path.display(), "listener: no debug screenshot yet");
                    return Ok(());
                }
                self.sink.send_file(path).await
            }
        }
    }
}

/// Polls one channel for commands.
pub struct CommandListener {
    client: Arc<DiscordClient>,
    channel_id: String,
    bot_user_id: String,
    handler: CommandHandler,
    poll_interval: Duration,
}

impl CommandListener {
    #[must_use]
    pub fn new(
        client: Arc<DiscordClient>,
        channel_id: String,
        bot_user_id: String,
        handler: CommandHandler,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            channel_id,
            bot_user_id,
            handler,
            poll_interval,
        }
    }

    /// Poll forever. Poll errors are logged and retried on the next tick.
    pub async fn run(self) {
        let mut cursor: Option<String> = None;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(channel = %self.channel_id, "listener: started");
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_once(&mut cursor).await {
                tracing::warn!(error = %e, "listener: poll failed");
            }
        }
    }

    /// Fetch messages after `cursor` and handle any commands among them.
    ///
    /// With no cursor yet, only positions the cursor at the latest message;
    /// earlier history is never replayed. Returns the number of commands
    /// handled.
    ///
    /// # Errors
    ///
    /// Returns the Discord error if the channel cannot be read.
    pub async fn poll_once(&self, cursor: &mut Option<String>) -> Result<usize, DiscordError> {
        let priming = cursor.is_none();
        let messages = self
            .client
            .messages_after(&self.channel_id, cursor.as_deref())
            .await?;

        if let Some(last) = messages.last() {
            *cursor = Some(last.id.clone());
        } else if priming {
            // Empty channel: anything posted from now on is new.
            *cursor = Some("0".to_string());
        }
        if priming {
            tracing::debug!(cursor = ?cursor, "listener: cursor primed");
            return Ok(0);
        }

        let mut handled = 0;
        for message in &messages {
            let Some(command) = self.command_in(message) else {
                continue;
            };
            tracing::info!(?command, author = %message.author.id, "listener: command received");
            if let Err(e) = self.handler.handle(command).await {
                tracing::warn!(?command, error = %e, "listener: reply failed");
            }
            handled += 1;
        }
        Ok(handled)
    }

    fn command_in(&self, message: &Message) -> Option<Command> {
        if message.author.id == self.bot_user_id {
            return None;
        }
        Command::parse(&message.content)
    }
}

#[cfg(test)]
#[path = "listener_test.rs"]
mod tests;
