pub mod app_config;
pub mod config;
pub mod filter;
pub mod format;
pub mod item;
pub mod notify;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use filter::{InterestFilter, Interesting};
pub use format::render_message;
pub use item::{Item, StockEntry, NO_ID};
pub use notify::{NotificationSink, NotifyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
