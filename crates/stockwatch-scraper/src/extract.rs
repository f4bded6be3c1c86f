//! Structured extraction over a settled page snapshot.

use scraper::Selector;
use stockwatch_core::Item;

use crate::browser::BrowserPage;
use crate::error::ScraperError;

/// Types in the [`ItemMapper`] signature, for implementors outside this crate.
pub use reqwest::Url;
pub use scraper::{ElementRef, Html};

/// Turns one container node into an [`Item`].
///
/// `document` is the whole page, for vendors that keep per-item data outside
/// the container. `page_url` is the URL the snapshot was taken from, used to
/// resolve relative links.
pub trait ItemMapper: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Extraction`] when the node does not have the
    /// expected shape.
    fn map(
        &self,
        node: ElementRef<'_>,
        document: &Html,
        page_url: Option<&Url>,
    ) -> Result<Item, ScraperError>;
}

impl<F> ItemMapper for F
where
    F: Fn(ElementRef<'_>, &Html, Option<&Url>) -> Result<Item, ScraperError> + Send + Sync,
{
    fn map(
        &self,
        node: ElementRef<'_>,
        document: &Html,
        page_url: Option<&Url>,
    ) -> Result<Item, ScraperError> {
        self(node, document, page_url)
    }
}

/// Applies an [`ItemMapper`] to every node matching a container selector.
#[derive(Debug, Clone)]
pub struct Extractor {
    container: Selector,
    container_text: String,
}

impl Extractor {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if `container_selector` is
    /// not valid CSS.
    pub fn new(container_selector: &str) -> Result<Self, ScraperError> {
        let container = parse_selector(container_selector)?;
        Ok(Self {
            container,
            container_text: container_selector.to_string(),
        })
    }

    #[must_use]
    pub fn container_selector(&self) -> &str {
        &self.container_text
    }

    /// Map every matching node of `html`, in document order.
    ///
    /// No match yields an empty list.
    ///
    /// # Errors
    ///
    /// The first mapper error aborts the whole extraction.
    pub fn extract(
        &self,
        html: &str,
        mapper: &dyn ItemMapper,
        page_url: Option<&str>,
    ) -> Result<Vec<Item>, ScraperError> {
        let document = Html::parse_document(html);
        let base = page_url.and_then(|raw| Url::parse(raw).ok());

        let items = document
            .select(&self.container)
            .enumerate()
            .map(|(index, node)| {
                mapper
                    .map(node, &document, base.as_ref())
                    .map_err(|e| match e {
                        ScraperError::Extraction { .. } => e,
                        other => ScraperError::Extraction {
                            index,
                            reason: other.to_string(),
                        },
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            selector = %self.container_text,
            count = items.len(),
            "extract: mapped container nodes"
        );
        Ok(items)
    }

    /// Snapshot `page` and extract from it.
    ///
    /// # Errors
    ///
    /// Returns the page's snapshot error or any [`Extractor::extract`] error.
    pub async fn extract_page(
        &self,
        page: &mut dyn BrowserPage,
        mapper: &dyn ItemMapper,
    ) -> Result<Vec<Item>, ScraperError> {
        let html = page.content().await?;
        let url = page.url().await?;
        self.extract(&html, mapper, url.as_deref())
    }
}

/// Parse a CSS selector, mapping the parser's error to [`ScraperError`].
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] on malformed input.
pub fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
