//! Page synchronization: drive a page until lazily-loaded content stops
//! arriving.
//!
//! State machine:
//!
//! ```text
//! Idle -> Navigating -> AwaitingSelector -> ScrollSettling -> Ready
//!                                              ^      |
//!                                              +------+  (until settled)
//! any state -> Failed
//! ```
//!
//! "Settled" is a heuristic. The default [`ResponseTimeoutSettle`] declares
//! the page complete the first time no successful network response arrives
//! within the response timeout after a scroll. A slow network can end the
//! loop before everything has loaded, and a page that keeps trickling
//! responses keeps the loop alive longer than needed; `max_iterations` bounds
//! the latter. Stronger completion signals (page counts, pagination cursors)
//! plug in through [`SettleStrategy`].

use std::path::PathBuf;
use std::time::Duration;

use crate::browser::{BrowserPage, BrowserSession, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::error::ScraperError;

/// Where a synchronization run currently is (or where it stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Navigating,
    AwaitingSelector,
    ScrollSettling,
    Ready,
    Failed,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::Navigating => "navigating",
            SyncState::AwaitingSelector => "awaiting_selector",
            SyncState::ScrollSettling => "scroll_settling",
            SyncState::Ready => "ready",
            SyncState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the settle loop has seen so far, handed to a [`SettleStrategy`]
/// after every scroll-and-wait iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleObservation {
    /// 1-based count of completed scroll-and-wait iterations.
    pub iteration: usize,
    /// Successful responses observed across all iterations.
    pub responses_observed: usize,
    /// Whether the most recent wait ended without a successful response.
    pub last_wait_timed_out: bool,
}

/// Decides when the settle loop may stop.
pub trait SettleStrategy: Send + Sync {
    fn is_settled(&self, observed: &SettleObservation) -> bool;
}

/// Settled as soon as one response wait times out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTimeoutSettle;

impl SettleStrategy for ResponseTimeoutSettle {
    fn is_settled(&self, observed: &SettleObservation) -> bool {
        observed.last_wait_timed_out
    }
}

/// Tunables for [`PageSynchronizer`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound for the container selector to appear.
    pub selector_timeout: Duration,
    /// Delay between selector probes.
    pub selector_poll_interval: Duration,
    /// How long each settle iteration waits for a successful response.
    pub response_timeout: Duration,
    /// Hard stop for the settle loop, whatever the strategy says.
    pub max_iterations: usize,
    /// When set, a screenshot is written here before the selector wait and
    /// on every settle iteration.
    pub debug_screenshot: Option<PathBuf>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            selector_timeout: Duration::from_secs(30),
            selector_poll_interval: Duration::from_millis(250),
            response_timeout: Duration::from_secs(5),
            max_iterations: 200,
            debug_screenshot: None,
        }
    }
}

/// Result of [`PageSynchronizer::load_and_settle`].
///
/// A failed run still hands back whatever page it managed to open so the
/// caller can close it; the caller treats a failure as zero items.
pub struct SyncOutcome {
    pub page: Option<Box<dyn BrowserPage>>,
    pub state: SyncState,
    /// Completed scroll-and-wait iterations.
    pub iterations: usize,
    pub responses_observed: usize,
    pub error: Option<ScraperError>,
}

impl SyncOutcome {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == SyncState::Ready
    }
}

impl std::fmt::Debug for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOutcome")
            .field("page", &self.page.as_ref().map(|_| "<page>"))
            .field("state", &self.state)
            .field("iterations", &self.iterations)
            .field("responses_observed", &self.responses_observed)
            .field("error", &self.error)
            .finish()
    }
}

#[derive(Debug, Default)]
struct Progress {
    state: Option<SyncState>,
    iterations: usize,
    responses_observed: usize,
}

impl Progress {
    fn state(&self) -> SyncState {
        self.state.unwrap_or(SyncState::Idle)
    }

    fn enter(&mut self, next: SyncState) {
        tracing::debug!(from = %self.state(), to = %next, "settle: state transition");
        self.state = Some(next);
    }
}

/// Loads a page and waits for infinite-scroll content to settle.
pub struct PageSynchronizer<S = ResponseTimeoutSettle> {
    options: SyncOptions,
    strategy: S,
}

impl PageSynchronizer<ResponseTimeoutSettle> {
    #[must_use]
    pub fn new(options: SyncOptions) -> Self {
        Self::with_strategy(options, ResponseTimeoutSettle)
    }
}

impl<S: SettleStrategy> PageSynchronizer<S> {
    #[must_use]
    pub fn with_strategy(options: SyncOptions, strategy: S) -> Self {
        Self { options, strategy }
    }

    /// Open a page, navigate to `url`, wait for `wait_for_selector`, then
    /// scroll until the settle strategy reports no further loading.
    ///
    /// Never returns an error directly: failures are reported through
    /// [`SyncOutcome::error`] with [`SyncState::Failed`].
    pub async fn load_and_settle(
        &self,
        session: &dyn BrowserSession,
        url: &str,
        wait_for_selector: &str,
    ) -> SyncOutcome {
        tracing::info!(url, "settle: loading page");
        let mut page = match session.open_page().await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(url, error = %e, "settle: could not open page");
                return SyncOutcome {
                    page: None,
                    state: SyncState::Failed,
                    iterations: 0,
                    responses_observed: 0,
                    error: Some(e),
                };
            }
        };

        let mut progress = Progress::default();
        let result = self
            .drive(page.as_mut(), url, wait_for_selector, &mut progress)
            .await;

        match result {
            Ok(()) => {
                progress.enter(SyncState::Ready);
                tracing::info!(
                    url,
                    iterations = progress.iterations,
                    responses = progress.responses_observed,
                    "settle: page ready"
                );
                SyncOutcome {
                    page: Some(page),
                    state: SyncState::Ready,
                    iterations: progress.iterations,
                    responses_observed: progress.responses_observed,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    url,
                    selector = wait_for_selector,
                    stage = %progress.state(),
                    error = %e,
                    "settle: synchronization failed"
                );
                progress.enter(SyncState::Failed);
                SyncOutcome {
                    page: Some(page),
                    state: SyncState::Failed,
                    iterations: progress.iterations,
                    responses_observed: progress.responses_observed,
                    error: Some(e),
                }
            }
        }
    }

    /// Open a page and navigate it to `url` without waiting for content.
    ///
    /// # Errors
    ///
    /// Returns the open or navigation error; a page opened before a failed
    /// navigation is closed first.
    pub async fn navigate(
        &self,
        session: &dyn BrowserSession,
        url: &str,
    ) -> Result<Box<dyn BrowserPage>, ScraperError> {
        let mut page = session.open_page().await?;
        if let Err(e) = page.goto(url).await {
            if let Err(close_err) = page.close().await {
                tracing::debug!(url, error = %close_err, "settle: close after failed navigation");
            }
            return Err(e);
        }
        Ok(page)
    }

    async fn drive(
        &self,
        page: &mut dyn BrowserPage,
        url: &str,
        selector: &str,
        progress: &mut Progress,
    ) -> Result<(), ScraperError> {
        progress.enter(SyncState::Navigating);
        page.goto(url).await?;
        page.set_viewport(VIEWPORT_WIDTH, VIEWPORT_HEIGHT).await?;
        self.debug_screenshot(page).await;

        progress.enter(SyncState::AwaitingSelector);
        self.wait_for_selector(page, selector).await?;

        progress.enter(SyncState::ScrollSettling);
        loop {
            self.debug_screenshot(page).await;
            page.scroll_to_bottom_of(selector).await?;

            let responded = page
                .next_successful_response(self.options.response_timeout)
                .await?;
            progress.iterations += 1;
            if responded {
                progress.responses_observed += 1;
            }

            let observed = SettleObservation {
                iteration: progress.iterations,
                responses_observed: progress.responses_observed,
                last_wait_timed_out: !responded,
            };
            tracing::debug!(
                iteration = observed.iteration,
                responded,
                "settle: scroll iteration"
            );

            if self.strategy.is_settled(&observed) {
                return Ok(());
            }
            if progress.iterations >= self.options.max_iterations {
                tracing::warn!(
                    url,
                    max_iterations = self.options.max_iterations,
                    "settle: iteration cap reached; treating page as loaded"
                );
                return Ok(());
            }
        }
    }

    async fn wait_for_selector(
        &self,
        page: &mut dyn BrowserPage,
        selector: &str,
    ) -> Result<(), ScraperError> {
        let poll = self.options.selector_poll_interval;
        let probe = async {
            loop {
                if page.has_selector(selector).await? {
                    return Ok::<(), ScraperError>(());
                }
                tokio::time::sleep(poll).await;
            }
        };

        match tokio::time::timeout(self.options.selector_timeout, probe).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ScraperError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_secs: self.options.selector_timeout.as_secs(),
            }),
        }
    }

    async fn debug_screenshot(&self, page: &mut dyn BrowserPage) {
        let Some(path) = &self.options.debug_screenshot else {
            return;
        };
        if let Err(e) = page.screenshot(path).await {
            tracing::warn!(error = %e, "settle: debug screenshot failed");
        }
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
