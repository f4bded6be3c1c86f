use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid values.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("TARGET_URL", "https://www.example.com/search?q=rtx");
    m.insert("CYCLE_INTERVAL_SECONDS", "300");
    m.insert("DISCORD_TOKEN", "test-token");
    m.insert("DISCORD_CHANNEL_ID", "1234567890");
    m
}

#[test]
fn build_app_config_fails_without_target_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "TARGET_URL"),
        "expected MissingEnvVar(TARGET_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_target_url_as_missing() {
    let mut map = full_env();
    map.insert("TARGET_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "TARGET_URL"),
        "expected MissingEnvVar(TARGET_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_http_target_url() {
    let mut map = full_env();
    map.insert("TARGET_URL", "ftp://example.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TARGET_URL"),
        "expected InvalidEnvVar(TARGET_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_cycle_interval() {
    let mut map = full_env();
    map.remove("CYCLE_INTERVAL_SECONDS");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CYCLE_INTERVAL_SECONDS"),
        "expected MissingEnvVar(CYCLE_INTERVAL_SECONDS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_numeric_cycle_interval() {
    let mut map = full_env();
    map.insert("CYCLE_INTERVAL_SECONDS", "five minutes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CYCLE_INTERVAL_SECONDS"),
        "expected InvalidEnvVar(CYCLE_INTERVAL_SECONDS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_cycle_interval() {
    let mut map = full_env();
    map.insert("CYCLE_INTERVAL_SECONDS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CYCLE_INTERVAL_SECONDS"),
        "expected InvalidEnvVar(CYCLE_INTERVAL_SECONDS), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_discord_token() {
    let mut map = full_env();
    map.remove("DISCORD_TOKEN");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DISCORD_TOKEN"),
        "expected MissingEnvVar(DISCORD_TOKEN), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.target_url, "https://www.example.com/search?q=rtx");
    assert_eq!(cfg.cycle_interval_secs, 300);
    assert!(cfg.favorite_item_ids.is_empty());
    assert!(cfg.location_whitelist.is_empty());
    assert!(!cfg.debug);
    assert_eq!(cfg.discord_channel_id, "1234567890");
    assert_eq!(cfg.discord_api_base, "https://discord.com/api/v10");
    assert_eq!(cfg.discord_max_retries, 3);
    assert_eq!(cfg.discord_backoff_base_ms, 1000);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.ledger_path, PathBuf::from("listings.csv"));
    assert_eq!(cfg.debug_screenshot_path, PathBuf::from("debug.png"));
    assert_eq!(cfg.selector_timeout_secs, 30);
    assert_eq!(cfg.settle_response_timeout_secs, 5);
    assert_eq!(cfg.settle_max_iterations, 200);
    assert_eq!(cfg.command_poll_secs, 2);
    assert!(!cfg.skip_notified);
    assert!(cfg.chrome_executable.is_none());
    assert!(cfg.headless);
}

#[test]
fn whitelist_keeps_declaration_order_and_trims_entries() {
    let mut map = full_env();
    map.insert("LOCATION_WHITELIST", " Ottawa Merivale, Kanata ,,Ottawa Downtown");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.location_whitelist,
        vec!["Ottawa Merivale", "Kanata", "Ottawa Downtown"]
    );
}

#[test]
fn favorites_are_split_on_commas() {
    let mut map = full_env();
    map.insert("FAVORITE_ITEM_IDS", "ABC1234567,XYZ7654321");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.favorite_item_ids, vec!["ABC1234567", "XYZ7654321"]);
}

#[test]
fn debug_flag_accepts_true_in_any_case() {
    for raw in ["TRUE", "true", "True"] {
        let mut map = full_env();
        map.insert("DEBUG", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.debug, "DEBUG={raw} should enable debug");
    }
}

#[test]
fn debug_flag_rejects_other_truthy_values() {
    for raw in ["1", "yes", "on", ""] {
        let mut map = full_env();
        map.insert("DEBUG", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(!cfg.debug, "DEBUG={raw} should not enable debug");
    }
}

#[test]
fn discord_api_base_trailing_slash_is_trimmed() {
    let mut map = full_env();
    map.insert("DISCORD_API_BASE", "http://127.0.0.1:9999/api/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.discord_api_base, "http://127.0.0.1:9999/api");
}

#[test]
fn skip_notified_override() {
    let mut map = full_env();
    map.insert("STOCKWATCH_SKIP_NOTIFIED", "yes");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.skip_notified);
}

#[test]
fn skip_notified_invalid() {
    let mut map = full_env();
    map.insert("STOCKWATCH_SKIP_NOTIFIED", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOCKWATCH_SKIP_NOTIFIED"),
        "expected InvalidEnvVar(STOCKWATCH_SKIP_NOTIFIED), got: {result:?}"
    );
}

#[test]
fn settle_response_timeout_override() {
    let mut map = full_env();
    map.insert("STOCKWATCH_SETTLE_RESPONSE_TIMEOUT_SECS", "10");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.settle_response_timeout_secs, 10);
}

#[test]
fn settle_max_iterations_invalid() {
    let mut map = full_env();
    map.insert("STOCKWATCH_SETTLE_MAX_ITERATIONS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STOCKWATCH_SETTLE_MAX_ITERATIONS"),
        "expected InvalidEnvVar(STOCKWATCH_SETTLE_MAX_ITERATIONS), got: {result:?}"
    );
}

#[test]
fn chrome_executable_override() {
    let mut map = full_env();
    map.insert("STOCKWATCH_CHROME_EXECUTABLE", "/usr/bin/chromium");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.chrome_executable,
        Some(PathBuf::from("/usr/bin/chromium"))
    );
}

#[test]
fn debug_output_redacts_token() {
    let cfg = build_app_config(lookup_from_map(&full_env())).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("test-token"));
    assert!(rendered.contains("[redacted]"));
}
