//! Discord REST payloads, limited to the fields this client reads or writes.

use serde::{Deserialize, Serialize};

/// A Discord user (`GET /users/@me`, message authors).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

/// A channel message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    /// Snowflake id; numeric order equals creation order.
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub content: String,
    pub author: User,
}

impl Message {
    /// Numeric snowflake, `0` if the id is not a number.
    #[must_use]
    pub fn snowflake(&self) -> u64 {
        self.id.parse().unwrap_or(0)
    }
}

/// Body of `POST /channels/{id}/messages` for plain text.
#[derive(Debug, Serialize)]
pub(crate) struct CreateMessage<'a> {
    pub content: &'a str,
}

/// Body of an HTTP 429 response.
#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitBody {
    /// Seconds, possibly fractional.
    pub retry_after: f64,
}
