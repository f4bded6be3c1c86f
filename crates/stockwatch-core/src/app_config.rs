use std::path::PathBuf;

/// Fully-resolved runtime configuration for the watcher daemon.
#[derive(Clone)]
pub struct AppConfig {
    pub target_url: String,
    pub favorite_item_ids: Vec<String>,
    /// Ordered: position defines display priority.
    pub location_whitelist: Vec<String>,
    pub cycle_interval_secs: u64,
    pub debug: bool,
    pub discord_token: String,
    pub discord_channel_id: String,
    pub discord_api_base: String,
    pub discord_max_retries: u32,
    pub discord_backoff_base_ms: u64,
    pub log_level: String,
    pub ledger_path: PathBuf,
    pub debug_screenshot_path: PathBuf,
    pub selector_timeout_secs: u64,
    pub settle_response_timeout_secs: u64,
    pub settle_max_iterations: usize,
    pub command_poll_secs: u64,
    /// Consult the ledger before notifying. Off by default: every cycle
    /// re-notifies every matching item.
    pub skip_notified: bool,
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("target_url", &self.target_url)
            .field("favorite_item_ids", &self.favorite_item_ids)
            .field("location_whitelist", &self.location_whitelist)
            .field("cycle_interval_secs", &self.cycle_interval_secs)
            .field("debug", &self.debug)
            .field("discord_token", &"[redacted]")
            .field("discord_channel_id", &self.discord_channel_id)
            .field("discord_api_base", &self.discord_api_base)
            .field("discord_max_retries", &self.discord_max_retries)
            .field("discord_backoff_base_ms", &self.discord_backoff_base_ms)
            .field("log_level", &self.log_level)
            .field("ledger_path", &self.ledger_path)
            .field("debug_screenshot_path", &self.debug_screenshot_path)
            .field("selector_timeout_secs", &self.selector_timeout_secs)
            .field(
                "settle_response_timeout_secs",
                &self.settle_response_timeout_secs,
            )
            .field("settle_max_iterations", &self.settle_max_iterations)
            .field("command_poll_secs", &self.command_poll_secs)
            .field("skip_notified", &self.skip_notified)
            .field("chrome_executable", &self.chrome_executable)
            .field("headless", &self.headless)
            .finish()
    }
}
