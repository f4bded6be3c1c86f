//! Browser automation capability.
//!
//! The pipeline only talks to [`BrowserSession`] and [`BrowserPage`]; the
//! chromiumoxide-backed implementation lives in [`chromium`]. Tests drive the
//! synchronizer with in-memory fakes of the same traits.

pub mod chromium;
#[cfg(any(test, feature = "test-support"))]
pub mod scripted;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

pub use chromium::{ChromiumBrowser, ChromiumLaunchOptions};

/// Logical viewport applied before waiting/scrolling so lazy-loading
/// triggers the same way on every host.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// A long-lived browser able to open pages.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a blank page (tab).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the automation layer refuses.
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScraperError>;
}

/// One page (tab) of a [`BrowserSession`].
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate to `url` and wait for the main document.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Navigation`] when the target is unreachable or
    /// answers with a non-success status.
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Override the logical viewport size.
    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), ScraperError>;

    /// Whether `selector` currently matches a node in the DOM.
    async fn has_selector(&mut self, selector: &str) -> Result<bool, ScraperError>;

    /// Scroll the window to the bottom edge of the first node matching
    /// `selector`, or by one viewport height when it cannot be measured.
    async fn scroll_to_bottom_of(&mut self, selector: &str) -> Result<(), ScraperError>;

    /// Wait up to `timeout` for the next successful (HTTP 200) network
    /// response. `Ok(false)` means the wait timed out.
    async fn next_successful_response(&mut self, timeout: Duration)
        -> Result<bool, ScraperError>;

    /// Write a PNG screenshot of the viewport to `path`.
    async fn screenshot(&mut self, path: &Path) -> Result<(), ScraperError>;

    /// Serialized DOM of the current document.
    async fn content(&mut self) -> Result<String, ScraperError>;

    /// URL of the current document, if known.
    async fn url(&mut self) -> Result<Option<String>, ScraperError>;

    /// Close the page and release its resources.
    async fn close(self: Box<Self>) -> Result<(), ScraperError>;
}
