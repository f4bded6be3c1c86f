//! Chrome DevTools Protocol implementation of the browser traits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::FrameId;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Handler, Page};
use futures::{FutureExt, StreamExt};
use tokio::task::JoinHandle;

use super::{BrowserPage, BrowserSession, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::error::ScraperError;

/// Launch settings for [`ChromiumBrowser`].
#[derive(Debug, Clone)]
pub struct ChromiumLaunchOptions {
    /// Browser binary; autodetected when `None`.
    pub executable: Option<PathBuf>,
    pub headless: bool,
}

impl Default for ChromiumLaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
        }
    }
}

/// A single Chromium process shared by every cycle.
pub struct ChromiumBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch a browser process and start its CDP event loop.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the config is rejected or the
    /// process cannot be started.
    pub async fn launch(options: &ChromiumLaunchOptions) -> Result<Self, ScraperError> {
        let mut builder =
            BrowserConfig::builder().window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScraperError::Browser)?;

        let (browser, handler) = Browser::launch(config).await?;
        let handler_task = spawn_handler_task(handler);
        tracing::info!(headless = options.headless, "browser: launched");

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Close the browser process and stop the event loop.
    pub async fn shutdown(self) {
        let mut browser = self.browser;
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "browser: close failed");
        }
        if let Err(e) = browser.wait().await {
            tracing::warn!(error = %e, "browser: wait for exit failed");
        }
        self.handler_task.abort();
        tracing::info!("browser: shut down");
    }
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::warn!(error = %e, "browser: handler event error");
            }
        }
        tracing::debug!("browser: handler loop ended");
    })
}

#[async_trait]
impl BrowserSession for ChromiumBrowser {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScraperError> {
        let page = self.browser.new_page("about:blank").await?;
        // Registered before the first navigation so the document response
        // and every later response reach this stream.
        let responses = page.event_listener::<EventResponseReceived>().await?;
        Ok(Box::new(ChromiumPage { page, responses }))
    }
}

struct ChromiumPage {
    page: Page,
    responses: EventStream<EventResponseReceived>,
}

impl ChromiumPage {
    /// Discard buffered response events, returning the status of the
    /// main frame's document response among them.
    fn drain_responses(&mut self, main_frame: Option<&FrameId>) -> Option<i64> {
        let mut buffered = Vec::new();
        while let Some(Some(event)) = self.responses.next().now_or_never() {
            buffered.push(event);
        }
        navigation_status(
            buffered
                .iter()
                .map(|e| (&e.r#type, e.frame_id.as_ref(), e.response.status)),
            main_frame,
        )
    }

    async fn evaluate_bool(&self, script: String) -> Result<bool, ScraperError> {
        self.page
            .evaluate(script)
            .await?
            .into_value::<bool>()
            .map_err(|e| ScraperError::Browser(format!("unexpected script result: {e}")))
    }
}

/// Status of the navigation's document among `(type, frame, status)`
/// responses.
///
/// Iframes load `Document` responses too, so only the main frame's count.
/// Without a known main frame, the first document wins: the top-level
/// document is requested before anything it embeds.
fn navigation_status<'a>(
    responses: impl IntoIterator<Item = (&'a ResourceType, Option<&'a FrameId>, i64)>,
    main_frame: Option<&FrameId>,
) -> Option<i64> {
    let mut documents = responses
        .into_iter()
        .filter(|(kind, _, _)| **kind == ResourceType::Document);
    match main_frame {
        Some(main) => documents
            .filter(|(_, frame, _)| *frame == Some(main))
            .last()
            .map(|(_, _, status)| status),
        None => documents.next().map(|(_, _, status)| status),
    }
}

/// JS string literal for `selector`.
fn js_string(selector: &str) -> String {
    serde_json::Value::String(selector.to_string()).to_string()
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let main_frame = match self.page.mainframe().await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(url, error = %e, "browser: main frame unknown");
                None
            }
        };
        match self.drain_responses(main_frame.as_ref()) {
            Some(status) if !(200..300).contains(&status) => Err(ScraperError::Navigation {
                url: url.to_string(),
                reason: format!("document answered with HTTP {status}"),
            }),
            Some(_) => Ok(()),
            None => {
                tracing::debug!(url, "browser: no document response observed");
                Ok(())
            }
        }
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), ScraperError> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(width),
            i64::from(height),
            1.0,
            false,
        );
        self.page.execute(params).await?;
        Ok(())
    }

    async fn has_selector(&mut self, selector: &str) -> Result<bool, ScraperError> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        self.evaluate_bool(script).await
    }

    async fn scroll_to_bottom_of(&mut self, selector: &str) -> Result<(), ScraperError> {
        // Responses already buffered belong to earlier activity; only those
        // arriving after this scroll count towards the next wait.
        self.drain_responses(None);
        let script = format!(
            "(() => {{ \
                const node = document.querySelector({sel}); \
                const bottom = node ? node.getBoundingClientRect().bottom : 0; \
                window.scrollTo(0, bottom || window.innerHeight); \
                return true; \
            }})()",
            sel = js_string(selector)
        );
        self.evaluate_bool(script).await.map(|_| ())
    }

    async fn next_successful_response(
        &mut self,
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let wait = async {
            while let Some(event) = self.responses.next().await {
                if event.response.status == 200 {
                    return true;
                }
            }
            false
        };
        Ok(tokio::time::timeout(timeout, wait).await.unwrap_or(false))
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), ScraperError> {
        self.page
            .save_screenshot(ScreenshotParams::builder().build(), path)
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::Screenshot {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        Ok(self.page.content().await?)
    }

    async fn url(&mut self) -> Result<Option<String>, ScraperError> {
        Ok(self.page.url().await?)
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        self.page.close().await?;
        Ok(())
    }
}
