pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod sink;
pub mod types;

pub use client::{DiscordClient, DEFAULT_API_BASE};
pub use error::DiscordError;
pub use sink::DiscordSink;
pub use types::{Message, User};
