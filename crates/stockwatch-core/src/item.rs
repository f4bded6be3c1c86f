use serde::{Deserialize, Serialize};

/// Identifier used when the vendor code cannot be parsed from a listing.
///
/// Identity is best-effort: every unparseable listing shares this value.
pub const NO_ID: &str = "no-id";

/// One scraped listing, as rendered by the vendor page at extraction time.
///
/// Items are snapshots. Each cycle produces a fresh batch and nothing in the
/// pipeline mutates an item once the extractor has returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Vendor-assigned item code, or [`NO_ID`].
    pub id: String,
    pub title: Option<String>,
    /// Raw display text, e.g. `"$1,299.99"`. Never parsed to a number.
    pub price: Option<String>,
    /// Absolute (or, when unresolvable, page-relative) URL of the listing.
    pub link: Option<String>,
    /// Per-location stock readings in page order.
    pub stocks: Vec<StockEntry>,
    /// Whether the vendor marks the listing as available.
    pub is_in_stock: bool,
}

impl Item {
    /// Returns `true` when the id is the shared [`NO_ID`] sentinel.
    #[must_use]
    pub fn has_sentinel_id(&self) -> bool {
        self.id == NO_ID
    }
}

/// A single stock reading for an [`Item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockEntry {
    /// Stock at a named location. `quantity` is raw display text and may
    /// contain markup (e.g. `"<strong>-</strong>"`).
    Reading { location: String, quantity: String },
    /// Sentinel produced when the page did not expose location data.
    /// `reference` is the vendor element id the lookup was keyed on, if any.
    Unresolved { reference: Option<String> },
}

impl StockEntry {
    #[must_use]
    pub fn reading(location: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self::Reading {
            location: location.into(),
            quantity: quantity.into(),
        }
    }

    #[must_use]
    pub fn as_reading(&self) -> Option<(&str, &str)> {
        match self {
            Self::Reading { location, quantity } => Some((location.as_str(), quantity.as_str())),
            Self::Unresolved { .. } => None,
        }
    }
}
