//! Extraction against a saved Canada Computers results page.

use stockwatch_core::{StockEntry, NO_ID};
use stockwatch_scraper::vendors::canada_computers::PROFILE;
use stockwatch_scraper::{CanadaComputersMapper, Extractor};

const SEARCH_PAGE: &str = include_str!("fixtures/canada_computers_search.html");
const PAGE_URL: &str = "https://www.canadacomputers.com/search/results_details.php?keywords=rtx";

fn extractor() -> Extractor {
    Extractor::new(PROFILE.container_selector).expect("valid container selector")
}

#[test]
fn extracts_every_listing_in_page_order() {
    let items = extractor()
        .extract(SEARCH_PAGE, &CanadaComputersMapper, Some(PAGE_URL))
        .expect("extraction succeeds");

    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["4070VNT2XO", "DUAL4060TI", NO_ID]);
}

#[test]
fn stock_panel_readings_skip_empty_stores() {
    let items = extractor()
        .extract(SEARCH_PAGE, &CanadaComputersMapper, Some(PAGE_URL))
        .expect("extraction succeeds");

    assert_eq!(
        items[0].stocks,
        vec![
            StockEntry::reading("Kanata", "2"),
            StockEntry::reading("Ottawa Downtown", "5+"),
        ]
    );
    assert_eq!(
        items[1].stocks,
        vec![StockEntry::Unresolved {
            reference: Some("239402".to_string())
        }]
    );
}

#[test]
fn availability_badge_and_links() {
    let items = extractor()
        .extract(SEARCH_PAGE, &CanadaComputersMapper, Some(PAGE_URL))
        .expect("extraction succeeds");

    let stocked: Vec<bool> = items.iter().map(|i| i.is_in_stock).collect();
    assert_eq!(stocked, vec![true, false, true]);
    assert_eq!(
        items[0].link.as_deref(),
        Some("https://www.canadacomputers.com/product_info.php?cPath=43_557_559&item_id=239401")
    );
    assert_eq!(
        items[2].link.as_deref(),
        Some("https://www.canadacomputers.com/product_info.php?item_id=239403")
    );
    assert_eq!(items[2].price.as_deref(), Some("$2,399.99"));
}

#[test]
fn repeated_extraction_of_same_snapshot_is_identical() {
    let first = extractor()
        .extract(SEARCH_PAGE, &CanadaComputersMapper, Some(PAGE_URL))
        .expect("first extraction");
    let second = extractor()
        .extract(SEARCH_PAGE, &CanadaComputersMapper, Some(PAGE_URL))
        .expect("second extraction");
    assert_eq!(first, second);
}

#[test]
fn page_without_listings_yields_no_items() {
    let html = "<html><body><div id=\"product-list\"></div></body></html>";
    let items = extractor()
        .extract(html, &CanadaComputersMapper, Some(PAGE_URL))
        .expect("extraction succeeds");
    assert!(items.is_empty());
}
