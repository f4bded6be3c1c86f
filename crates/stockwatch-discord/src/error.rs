use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the Discord REST client.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429. `retry_after_ms` is the server's requested wait.
    #[error("rate limited by Discord; retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-2xx status.
    #[error("Discord answered HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A local attachment could not be read.
    #[error("cannot read attachment {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid Discord API base URL '{0}'")]
    InvalidBaseUrl(String),
}
