//! One scrape cycle: settle the page, extract, filter, notify, record.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stockwatch_core::{render_message, AppConfig, InterestFilter, Item, NotificationSink};
use stockwatch_ledger::DedupLedger;
use stockwatch_scraper::vendors::canada_computers;
use stockwatch_scraper::{
    BrowserSession, CanadaComputersMapper, Extractor, ItemMapper, PageSynchronizer, ScraperError,
    SyncOptions, SyncOutcome, VendorProfile,
};

/// Counters for one cycle, logged by the scheduler closure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items the extractor returned.
    pub extracted: usize,
    /// Items the vendor marked as available.
    pub available: usize,
    /// Items with stock at a whitelisted location.
    pub matched: usize,
    pub notified: usize,
    pub delivery_failures: usize,
    pub ledger_failures: usize,
    /// Matches left out because the ledger already had them.
    pub skipped_known: usize,
}

/// Everything a cycle needs, built once at startup and shared by all cycles.
pub struct CycleContext {
    pub browser: Arc<dyn BrowserSession>,
    pub synchronizer: PageSynchronizer,
    pub extractor: Extractor,
    pub mapper: Arc<dyn ItemMapper>,
    pub profile: VendorProfile,
    pub target_url: String,
    pub filter: InterestFilter,
    pub sink: Arc<dyn NotificationSink>,
    pub ledger: Arc<DedupLedger>,
    /// Consult the ledger before notifying. Off by default: every match is
    /// re-announced each cycle.
    pub skip_notified: bool,
}

impl CycleContext {
    /// Wire the Canada Computers pipeline from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if the vendor container
    /// selector does not parse.
    pub fn from_config(
        config: &AppConfig,
        browser: Arc<dyn BrowserSession>,
        sink: Arc<dyn NotificationSink>,
        ledger: Arc<DedupLedger>,
    ) -> Result<Self, ScraperError> {
        let profile = canada_computers::PROFILE;
        Ok(Self {
            browser,
            synchronizer: PageSynchronizer::new(sync_options(config)),
            extractor: Extractor::new(profile.container_selector)?,
            mapper: Arc::new(CanadaComputersMapper),
            profile,
            target_url: config.target_url.clone(),
            filter: InterestFilter::new(
                config.location_whitelist.clone(),
                config.favorite_item_ids.clone(),
            ),
            sink,
            ledger,
            skip_notified: config.skip_notified,
        })
    }
}

#[must_use]
pub fn sync_options(config: &AppConfig) -> SyncOptions {
    SyncOptions {
        selector_timeout: Duration::from_secs(config.selector_timeout_secs),
        response_timeout: Duration::from_secs(config.settle_response_timeout_secs),
        max_iterations: config.settle_max_iterations,
        debug_screenshot: debug_screenshot_path(config),
        ..SyncOptions::default()
    }
}

/// Screenshot destination, only when `DEBUG` is on.
#[must_use]
pub fn debug_screenshot_path(config: &AppConfig) -> Option<PathBuf> {
    config.debug.then(|| config.debug_screenshot_path.clone())
}

/// Run one cycle. Every failure inside is logged and degrades to fewer (or
/// zero) notifications; nothing escapes.
pub async fn run_cycle(ctx: &CycleContext) -> CycleReport {
    let mut report = CycleReport::default();

    let items = load_items(ctx).await;
    report.extracted = items.len();

    let available: Vec<Item> = items.into_iter().filter(|item| item.is_in_stock).collect();
    report.available = available.len();

    let matched = ctx.filter.filter(&available);
    report.matched = matched.len();

    let vendor = ctx.profile.tag;
    let mut known = known_ids(ctx).await;
    for interesting in &matched {
        let item = &interesting.item;
        let item_id = item.id.as_str();

        // Sentinel ids are shared by unrelated listings and never dedup.
        let identifiable = !item.has_sentinel_id();
        if identifiable && known.as_ref().is_some_and(|ids| ids.contains(item_id)) {
            tracing::debug!(item_id, "cycle: already notified; skipping");
            report.skipped_known += 1;
            continue;
        }

        if let Err(e) = ctx.sink.send_text(&render_message(interesting)).await {
            tracing::warn!(item_id, error = %e, "cycle: notification not delivered");
            report.delivery_failures += 1;
            continue;
        }
        report.notified += 1;
        if identifiable {
            if let Some(ids) = known.as_mut() {
                ids.insert(item_id.to_string());
            }
        }

        if let Err(e) = ctx.ledger.record(vendor, item_id).await {
            tracing::error!(
                item_id,
                ledger = %ctx.ledger.path().display(),
                error = %e,
                "cycle: ledger append failed; dedup record is incomplete"
            );
            report.ledger_failures += 1;
        }
    }

    report
}

/// Ids already in the ledger, when `skip_notified` is on. A read failure
/// disables the check for this cycle.
async fn known_ids(ctx: &CycleContext) -> Option<HashSet<String>> {
    if !ctx.skip_notified {
        return None;
    }
    match ctx.ledger.recorded_ids(ctx.profile.tag).await {
        Ok(ids) => Some(ids),
        Err(e) => {
            tracing::warn!(error = %e, "cycle: ledger read failed; notifying without dedup");
            None
        }
    }
}

/// Settle and extract, then close the page. Any failure yields no items.
async fn load_items(ctx: &CycleContext) -> Vec<Item> {
    let outcome = ctx
        .synchronizer
        .load_and_settle(ctx.browser.as_ref(), &ctx.target_url, ctx.profile.wait_selector)
        .await;
    let ready = outcome.is_ready();
    let SyncOutcome {
        mut page, error, ..
    } = outcome;

    let items = match (ready, page.as_deref_mut()) {
        (true, Some(page)) => match ctx.extractor.extract_page(page, ctx.mapper.as_ref()).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    container = ctx.extractor.container_selector(),
                    error = %e,
                    "cycle: extraction failed; no items this cycle"
                );
                Vec::new()
            }
        },
        _ => {
            if let Some(e) = error {
                tracing::warn!(
                    url = %ctx.target_url,
                    error = %e,
                    "cycle: page not ready; no items this cycle"
                );
            }
            Vec::new()
        }
    };

    if let Some(page) = page {
        if let Err(e) = page.close().await {
            tracing::warn!(error = %e, "cycle: page close failed");
        }
    }

    items
}

#[cfg(test)]
#[path = "cycle_test.rs"]
mod tests;
