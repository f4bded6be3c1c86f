use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the process environment so
/// tests can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(&or_default(var, default)).ok_or_else(|| {
            invalid(var, "expected one of true/false, 1/0, yes/no".to_string())
        })
    };

    let target_url = require("TARGET_URL")?;
    validate_target_url(&target_url).map_err(|reason| invalid("TARGET_URL", reason))?;

    let cycle_interval_secs = require("CYCLE_INTERVAL_SECONDS")?
        .trim()
        .parse::<u64>()
        .map_err(|e| invalid("CYCLE_INTERVAL_SECONDS", e.to_string()))?;
    if cycle_interval_secs == 0 {
        return Err(invalid(
            "CYCLE_INTERVAL_SECONDS",
            "must be greater than zero".to_string(),
        ));
    }

    let discord_token = require("DISCORD_TOKEN")?;
    let discord_channel_id = require("DISCORD_CHANNEL_ID")?;

    let favorite_item_ids = split_list(&or_default("FAVORITE_ITEM_IDS", ""));
    let location_whitelist = split_list(&or_default("LOCATION_WHITELIST", ""));
    let debug = is_debug_enabled(&or_default("DEBUG", ""));

    let discord_api_base = or_default("DISCORD_API_BASE", "https://discord.com/api/v10")
        .trim_end_matches('/')
        .to_string();
    let discord_max_retries = parse_u32("STOCKWATCH_DISCORD_MAX_RETRIES", "3")?;
    let discord_backoff_base_ms = parse_u64("STOCKWATCH_DISCORD_BACKOFF_BASE_MS", "1000")?;

    let log_level = or_default("STOCKWATCH_LOG_LEVEL", "info");
    let ledger_path = PathBuf::from(or_default("STOCKWATCH_LEDGER_PATH", "listings.csv"));
    let debug_screenshot_path =
        PathBuf::from(or_default("STOCKWATCH_DEBUG_SCREENSHOT_PATH", "debug.png"));

    let selector_timeout_secs = parse_u64("STOCKWATCH_SELECTOR_TIMEOUT_SECS", "30")?;
    let settle_response_timeout_secs = parse_u64("STOCKWATCH_SETTLE_RESPONSE_TIMEOUT_SECS", "5")?;
    let settle_max_iterations = parse_usize("STOCKWATCH_SETTLE_MAX_ITERATIONS", "200")?;
    let command_poll_secs = parse_u64("STOCKWATCH_COMMAND_POLL_SECS", "2")?;
    let skip_notified = parse_flag("STOCKWATCH_SKIP_NOTIFIED", "false")?;
    let chrome_executable = lookup("STOCKWATCH_CHROME_EXECUTABLE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);
    let headless = parse_flag("STOCKWATCH_HEADLESS", "true")?;

    Ok(AppConfig {
        target_url,
        favorite_item_ids,
        location_whitelist,
        cycle_interval_secs,
        debug,
        discord_token,
        discord_channel_id,
        discord_api_base,
        discord_max_retries,
        discord_backoff_base_ms,
        log_level,
        ledger_path,
        debug_screenshot_path,
        selector_timeout_secs,
        settle_response_timeout_secs,
        settle_max_iterations,
        command_poll_secs,
        skip_notified,
        chrome_executable,
        headless,
    })
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
/// Declaration order is preserved.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `DEBUG` is enabled only by the literal `TRUE`, compared case-insensitively.
#[must_use]
pub fn is_debug_enabled(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Cheap shape check so a typo in `TARGET_URL` fails at startup rather than
/// as a navigation error on every cycle.
fn validate_target_url(url: &str) -> Result<(), String> {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(())
    } else {
        Err(format!("\"{trimmed}\" must start with http:// or https://"))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
