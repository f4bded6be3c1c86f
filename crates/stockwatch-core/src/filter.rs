//! Interest selection and stock ordering.
//!
//! The location whitelist decides *whether* an item is reported; favorites
//! only decide *how* it is rendered. A favorite that is not stocked at any
//! whitelisted location is dropped like any other item.

use crate::item::{Item, StockEntry};

/// An item that passed the whitelist, with its display-ready stock list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interesting {
    pub item: Item,
    /// Whitelisted readings as `(location, quantity)`, in whitelist order.
    pub display_stocks: Vec<(String, String)>,
    pub is_favorite: bool,
}

/// Operator-defined interest criteria.
#[derive(Debug, Clone, Default)]
pub struct InterestFilter {
    whitelist: Vec<String>,
    favorites: Vec<String>,
}

impl InterestFilter {
    #[must_use]
    pub fn new(whitelist: Vec<String>, favorites: Vec<String>) -> Self {
        Self {
            whitelist,
            favorites,
        }
    }

    /// Position of `location` in the whitelist, if whitelisted.
    ///
    /// Duplicated whitelist entries resolve to their first position.
    fn rank(&self, location: &str) -> Option<usize> {
        self.whitelist.iter().position(|w| w == location)
    }

    #[must_use]
    pub fn is_favorite(&self, item_id: &str) -> bool {
        self.favorites.iter().any(|f| f == item_id)
    }

    /// Whitelisted readings of `stocks`, ordered by whitelist position.
    ///
    /// The sort is stable: readings sharing a location keep their page order.
    /// Quantities are passed through verbatim.
    #[must_use]
    pub fn display_stocks(&self, stocks: &[StockEntry]) -> Vec<(String, String)> {
        let mut ranked: Vec<(usize, &str, &str)> = stocks
            .iter()
            .filter_map(StockEntry::as_reading)
            .filter_map(|(location, quantity)| {
                self.rank(location).map(|rank| (rank, location, quantity))
            })
            .collect();
        ranked.sort_by_key(|(rank, _, _)| *rank);
        ranked
            .into_iter()
            .map(|(_, location, quantity)| (location.to_string(), quantity.to_string()))
            .collect()
    }

    /// Keep items with at least one stock reading at a whitelisted location.
    ///
    /// Input order is preserved. An empty whitelist therefore selects nothing.
    #[must_use]
    pub fn filter(&self, items: &[Item]) -> Vec<Interesting> {
        items
            .iter()
            .filter_map(|item| {
                let display_stocks = self.display_stocks(&item.stocks);
                if display_stocks.is_empty() {
                    return None;
                }
                Some(Interesting {
                    item: item.clone(),
                    display_stocks,
                    is_favorite: self.is_favorite(&item.id),
                })
            })
            .collect()
    }
}
