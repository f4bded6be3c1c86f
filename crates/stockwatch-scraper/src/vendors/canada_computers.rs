//! Canada Computers search results.
//!
//! Each listing is a `[data-item-id]` node. Per-store stock is not inside the
//! listing: it lives in a popover panel elsewhere in the document, keyed by
//! the listing's `data-item-id` through a `stocklevel-pop-{id}` class.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use stockwatch_core::{Item, StockEntry, NO_ID};

use super::VendorProfile;
use crate::error::ScraperError;
use crate::extract::ItemMapper;

pub const PROFILE: VendorProfile = VendorProfile {
    tag: "canadacomputers",
    wait_selector: "#product-list",
    container_selector: "[data-item-id]",
};

/// Quantity markup the vendor renders for "no stock at this store".
pub const EMPTY_QUANTITY: &str = "<strong>-</strong>";

const ITEM_ID_ATTR: &str = "data-item-id";
const PANEL_CLASS_PREFIX: &str = "stocklevel-pop-";

static ITEM_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z0-9]{10}").expect("valid item code regex"));

static CODE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.d-none.d-sm-inline.font-weight-bold").expect("valid code selector")
});
static PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".pq-hdr-product_price strong").expect("valid price selector")
});
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".productTemplate_title a").expect("valid title selector"));
static PANEL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".stocklevel-pop").expect("valid panel selector"));
static STOCK_NUMBER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".stocknumber").expect("valid stocknumber selector"));
static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid anchor selector"));
static IN_STOCK_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[data-stocklevel-pop-id] .pq-hdr-bolder").expect("valid in-stock selector")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct CanadaComputersMapper;

impl ItemMapper for CanadaComputersMapper {
    fn map(
        &self,
        node: ElementRef<'_>,
        document: &Html,
        page_url: Option<&Url>,
    ) -> Result<Item, ScraperError> {
        let title_anchor = node.select(&TITLE_SEL).next();
        Ok(Item {
            id: item_code(node),
            title: title_anchor.map(|a| a.inner_html()),
            price: first_inner_html(node, &PRICE_SEL),
            link: title_anchor
                .and_then(|a| a.value().attr("href"))
                .map(|href| resolve_link(href, page_url)),
            stocks: stocks(node, document),
            is_in_stock: node.select(&IN_STOCK_SEL).next().is_some(),
        })
    }
}

fn first_inner_html(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    node.select(selector).next().map(|el| el.inner_html())
}

/// First ten-character uppercase code in the code span, else [`NO_ID`].
fn item_code(node: ElementRef<'_>) -> String {
    first_inner_html(node, &CODE_SEL)
        .and_then(|content| ITEM_CODE_RE.find(&content).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| NO_ID.to_string())
}

fn resolve_link(href: &str, page_url: Option<&Url>) -> String {
    page_url
        .and_then(|base| base.join(href).ok())
        .map_or_else(|| href.to_string(), String::from)
}

fn stocks(node: ElementRef<'_>, document: &Html) -> Vec<StockEntry> {
    let Some(element_id) = node.value().attr(ITEM_ID_ATTR) else {
        return vec![StockEntry::Unresolved { reference: None }];
    };

    let panel_class = format!("{PANEL_CLASS_PREFIX}{element_id}");
    let Some(panel) = document
        .select(&PANEL_SEL)
        .find(|panel| panel.value().classes().any(|c| c == panel_class))
    else {
        tracing::debug!(element_id, "canadacomputers: no stock panel for listing");
        return vec![StockEntry::Unresolved {
            reference: Some(element_id.to_string()),
        }];
    };

    panel
        .select(&STOCK_NUMBER_SEL)
        .filter_map(|stock_number| {
            let quantity = stock_number.inner_html();
            if quantity == EMPTY_QUANTITY {
                return None;
            }
            let location = store_name(stock_number)?;
            Some(StockEntry::Reading { location, quantity })
        })
        .collect()
}

/// Store name of a `.stocknumber` cell: the first link of its row, which is
/// the cell's fourth ancestor.
fn store_name(stock_number: ElementRef<'_>) -> Option<String> {
    let row = stock_number.ancestors().nth(3).and_then(ElementRef::wrap)?;
    row.select(&ANCHOR_SEL).next().map(|a| a.inner_html())
}
