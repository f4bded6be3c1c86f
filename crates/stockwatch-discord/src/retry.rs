//! Retry with exponential back-off and jitter for Discord requests.
//!
//! Network failures, 5xx answers and 429s are retried. A 429 waits for the
//! server's `retry_after` instead of the computed back-off.

use std::future::Future;
use std::time::Duration;

use crate::error::DiscordError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a delay.
pub(crate) fn is_retriable(err: &DiscordError) -> bool {
    match err {
        DiscordError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        DiscordError::RateLimited { .. } => true,
        DiscordError::UnexpectedStatus { status, .. } => *status >= 500,
        DiscordError::Deserialize { .. }
        | DiscordError::Io { .. }
        | DiscordError::InvalidBaseUrl(_) => false,
    }
}

/// Delay before retry number `attempt` (1-based).
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep                          |
/// |---------|--------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter    |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter    |
/// | 3       | 1 000 ms × 2² ± 25 % jitter    |
///
/// Rate-limit waits use the server's value without jitter. Both are capped
/// at 60 s.
pub(crate) fn delay_for(err: &DiscordError, attempt: u32, backoff_base_ms: u64) -> Duration {
    if let DiscordError::RateLimited { retry_after_ms } = err {
        return Duration::from_millis((*retry_after_ms).min(MAX_DELAY_MS));
    }
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(delay_ms.min(MAX_DELAY_MS))
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// retriable errors. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DiscordError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DiscordError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = delay_for(&err, attempt, backoff_base_ms);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "discord: transient error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn deserialize_err() -> DiscordError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        DiscordError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&DiscordError::UnexpectedStatus {
            status: 403,
            body: "Missing Access".to_owned()
        }));
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn server_errors_and_rate_limits_are_retriable() {
        assert!(is_retriable(&DiscordError::UnexpectedStatus {
            status: 502,
            body: String::new()
        }));
        assert!(is_retriable(&DiscordError::RateLimited { retry_after_ms: 10 }));
    }

    #[test]
    fn rate_limit_delay_honours_server_value_with_cap() {
        let short = DiscordError::RateLimited { retry_after_ms: 1_500 };
        assert_eq!(delay_for(&short, 1, 1_000), Duration::from_millis(1_500));
        let long = DiscordError::RateLimited {
            retry_after_ms: 3_600_000,
        };
        assert_eq!(delay_for(&long, 1, 1_000), Duration::from_millis(MAX_DELAY_MS));
    }

    #[test]
    fn backoff_delay_stays_within_jitter_band() {
        let err = DiscordError::UnexpectedStatus {
            status: 500,
            body: String::new(),
        };
        for _ in 0..50 {
            let d = delay_for(&err, 3, 1_000).as_millis();
            assert!((3_000..=5_000).contains(&d), "delay {d} outside 4000 ± 25 %");
        }
        assert!(delay_for(&err, 30, 1_000) <= Duration::from_millis(MAX_DELAY_MS));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, DiscordError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(DiscordError::RateLimited { retry_after_ms: 1 })
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(DiscordError::UnexpectedStatus {
                    status: 503,
                    body: String::new(),
                })
            }
        })
        .await;
        assert!(matches!(
            result,
            Err(DiscordError::UnexpectedStatus { status: 503, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_forbidden() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(DiscordError::UnexpectedStatus {
                    status: 403,
                    body: String::new(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
