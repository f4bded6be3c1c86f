use super::*;

fn test_client(base_url: &str) -> DiscordClient {
    DiscordClient::new(base_url, "test-token", 0, 0).expect("client construction should not fail")
}

#[test]
fn endpoint_appends_to_versioned_base() {
    let client = test_client(DEFAULT_API_BASE);
    let url = client.endpoint("channels/42/messages").unwrap();
    assert_eq!(url.as_str(), "https://discord.com/api/v10/channels/42/messages");
}

#[test]
fn endpoint_tolerates_trailing_slash() {
    let client = test_client("https://discord.com/api/v10/");
    let url = client.endpoint("users/@me").unwrap();
    assert_eq!(url.as_str(), "https://discord.com/api/v10/users/@me");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = DiscordClient::new("not a url", "t", 0, 0).unwrap_err();
    assert!(matches!(err, DiscordError::InvalidBaseUrl(ref u) if u == "not a url"));
}

#[test]
fn debug_output_hides_token() {
    let rendered = format!("{:?}", test_client(DEFAULT_API_BASE));
    assert!(!rendered.contains("test-token"));
}
