//! Deterministic in-memory browser for tests.
//!
//! Every page opened from a [`ScriptedBrowser`] serves the same
//! [`PageScript`] and records what the caller did in a shared [`PageLog`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserPage, BrowserSession};
use crate::error::ScraperError;

/// Behaviour of every page opened from a [`ScriptedBrowser`].
#[derive(Debug, Clone)]
pub struct PageScript {
    pub html: String,
    pub url: String,
    /// `Some(reason)` makes `goto` fail with [`ScraperError::Navigation`].
    pub navigation_error: Option<String>,
    /// Number of failed probes before the selector appears; `None` = never.
    pub selector_after_probes: Option<usize>,
    /// Outcome of each successive response wait; exhausted = timeout.
    pub responses: Vec<bool>,
    pub fail_screenshots: bool,
}

impl PageScript {
    /// A page whose selector is present immediately and whose network is
    /// silent after load.
    #[must_use]
    pub fn static_html(url: &str, html: &str) -> Self {
        Self {
            html: html.to_string(),
            url: url.to_string(),
            navigation_error: None,
            selector_after_probes: Some(0),
            responses: Vec::new(),
            fail_screenshots: false,
        }
    }
}

/// Calls recorded across all pages of a [`ScriptedBrowser`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageLog {
    pub opened: usize,
    pub closed: usize,
    pub gotos: Vec<String>,
    pub viewport: Option<(u32, u32)>,
    pub selector_probes: usize,
    pub scrolls: usize,
    pub response_waits: usize,
    pub screenshots: usize,
    pub content_reads: usize,
}

pub struct ScriptedBrowser {
    script: Mutex<PageScript>,
    log: Arc<Mutex<PageLog>>,
    fail_open: bool,
}

impl ScriptedBrowser {
    #[must_use]
    pub fn new(script: PageScript) -> Self {
        Self {
            script: Mutex::new(script),
            log: Arc::new(Mutex::new(PageLog::default())),
            fail_open: false,
        }
    }

    /// A browser whose `open_page` always fails.
    #[must_use]
    pub fn failing_to_open() -> Self {
        let mut browser = Self::new(PageScript::static_html("about:blank", ""));
        browser.fail_open = true;
        browser
    }

    /// Replace the script served to pages opened from now on.
    pub fn set_script(&self, script: PageScript) {
        *lock(&self.script) = script;
    }

    /// Snapshot of recorded calls.
    #[must_use]
    pub fn log(&self) -> PageLog {
        lock(&self.log).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl BrowserSession for ScriptedBrowser {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScraperError> {
        if self.fail_open {
            return Err(ScraperError::Browser("scripted open failure".to_string()));
        }
        lock(&self.log).opened += 1;
        Ok(Box::new(ScriptedPage {
            script: lock(&self.script).clone(),
            log: Arc::clone(&self.log),
            probes: 0,
            waits: 0,
        }))
    }
}

struct ScriptedPage {
    script: PageScript,
    log: Arc<Mutex<PageLog>>,
    probes: usize,
    waits: usize,
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        lock(&self.log).gotos.push(url.to_string());
        match &self.script.navigation_error {
            Some(reason) => Err(ScraperError::Navigation {
                url: url.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), ScraperError> {
        lock(&self.log).viewport = Some((width, height));
        Ok(())
    }

    async fn has_selector(&mut self, _selector: &str) -> Result<bool, ScraperError> {
        lock(&self.log).selector_probes += 1;
        let present = self
            .script
            .selector_after_probes
            .is_some_and(|after| self.probes >= after);
        self.probes += 1;
        Ok(present)
    }

    async fn scroll_to_bottom_of(&mut self, _selector: &str) -> Result<(), ScraperError> {
        lock(&self.log).scrolls += 1;
        Ok(())
    }

    async fn next_successful_response(
        &mut self,
        _timeout: Duration,
    ) -> Result<bool, ScraperError> {
        lock(&self.log).response_waits += 1;
        let responded = self.script.responses.get(self.waits).copied().unwrap_or(false);
        self.waits += 1;
        Ok(responded)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), ScraperError> {
        lock(&self.log).screenshots += 1;
        if self.script.fail_screenshots {
            return Err(ScraperError::Screenshot {
                path: path.display().to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        lock(&self.log).content_reads += 1;
        Ok(self.script.html.clone())
    }

    async fn url(&mut self) -> Result<Option<String>, ScraperError> {
        Ok(Some(self.script.url.clone()))
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        lock(&self.log).closed += 1;
        Ok(())
    }
}
