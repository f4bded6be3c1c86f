//! HTTP client for the Discord REST API (bot token auth).
//!
//! Only the calls the watcher needs: identify the bot, post text, post a
//! file, and page through recent channel messages. Every call goes through
//! [`retry_with_backoff`].

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::DiscordError;
use crate::retry::retry_with_backoff;
use crate::types::{CreateMessage, Message, RateLimitBody, User};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MESSAGE_PAGE_LIMIT: u8 = 100;

/// Client for the Discord REST API.
///
/// Use [`DiscordClient::new`] with [`DEFAULT_API_BASE`] in production or
/// point it at a mock server in tests.
pub struct DiscordClient {
    client: Client,
    token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// # Errors
    ///
    /// Returns [`DiscordError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`DiscordError::InvalidBaseUrl`] if `api_base` does not
    /// parse.
    pub fn new(
        api_base: &str,
        token: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("DiscordBot (stockwatch, ", env!("CARGO_PKG_VERSION"), ")"))
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", api_base.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| DiscordError::InvalidBaseUrl(api_base.to_owned()))?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// The bot's own user (`GET /users/@me`). Doubles as a token check.
    ///
    /// # Errors
    ///
    /// Returns [`DiscordError::UnexpectedStatus`] (401) on a bad token, or
    /// any transport error after retries.
    pub async fn current_user(&self) -> Result<User, DiscordError> {
        let url = self.endpoint("users/@me")?;
        self.send_json(|| self.client.get(url.clone()), "users/@me")
            .await
    }

    /// Post `content` to `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns any transport or status error after retries.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message, DiscordError> {
        let url = self.endpoint(&format!("channels/{channel_id}/messages"))?;
        let body = CreateMessage { content };
        self.send_json(|| self.client.post(url.clone()).json(&body), "create message")
            .await
    }

    /// Post the file at `path` to `channel_id` as an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`DiscordError::Io`] if the file cannot be read, otherwise
    /// any transport or status error after retries.
    pub async fn send_file(&self, channel_id: &str, path: &Path) -> Result<Message, DiscordError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| DiscordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "attachment".to_owned(), |n| n.to_string_lossy().into_owned());
        let url = self.endpoint(&format!("channels/{channel_id}/messages"))?;

        self.send_json(
            || {
                let part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                self.client
                    .post(url.clone())
                    .multipart(Form::new().part("files[0]", part))
            },
            "upload attachment",
        )
        .await
    }

    /// Messages in `channel_id` newer than `after`, oldest first.
    ///
    /// With `after = None` only the single most recent message is returned,
    /// which callers use to position a cursor without replaying history.
    ///
    /// # Errors
    ///
    /// Returns any transport, status, or decoding error after retries.
    pub async fn messages_after(
        &self,
        channel_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<Message>, DiscordError> {
        let mut url = self.endpoint(&format!("channels/{channel_id}/messages"))?;
        {
            let mut pairs = url.query_pairs_mut();
            match after {
                Some(after) => {
                    pairs.append_pair("after", after);
                    pairs.append_pair("limit", &MESSAGE_PAGE_LIMIT.to_string());
                }
                None => {
                    pairs.append_pair("limit", "1");
                }
            }
        }

        let mut messages: Vec<Message> = self
            .send_json(|| self.client.get(url.clone()), "list messages")
            .await?;
        messages.sort_by_key(Message::snowflake);
        Ok(messages)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DiscordError> {
        self.base_url
            .join(path)
            .map_err(|_| DiscordError::InvalidBaseUrl(format!("{}{path}", self.base_url)))
    }

    async fn send_json<T, F>(&self, build: F, context: &str) -> Result<T, DiscordError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let build = &build;
        let token = self.token.as_str();
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = build()
                .header(reqwest::header::AUTHORIZATION, format!("Bot {token}"))
                .send()
                .await?;
            let response = check_status(response).await?;
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|source| DiscordError::Deserialize {
                context: context.to_owned(),
                source,
            })
        })
        .await
    }
}

/// Map 429 and other non-2xx answers to typed errors.
async fn check_status(response: Response) -> Result<Response, DiscordError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let header_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());
        let body = response.text().await.unwrap_or_default();
        let body_secs = serde_json::from_str::<RateLimitBody>(&body)
            .ok()
            .map(|b| b.retry_after);
        let secs = body_secs.or(header_secs).unwrap_or(1.0).max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let retry_after_ms = (secs * 1_000.0).ceil() as u64;
        return Err(DiscordError::RateLimited { retry_after_ms });
    }
    let body = response.text().await.unwrap_or_default();
    Err(DiscordError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
