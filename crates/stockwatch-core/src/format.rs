//! Chat message rendering for matched items.

use crate::filter::Interesting;

const FENCE: &str = "```";

/// Code-block language tag used to highlight favorites.
pub const FAVORITE_STYLE: &str = "fix";

/// Placeholder for absent title/price fields.
pub const ABSENT: &str = "n/a";

/// Render one notification message.
///
/// ~~~text
/// https://vendor.example/item
/// ```fix
/// | ID: ABC1234567
/// | TITLE: Some GPU
/// | PRICE: $999.99
/// | STOCK: Ottawa: 2, Kanata: 1
/// ```
/// ~~~
///
/// The link line is omitted when the listing has no link. Vendor text is not
/// escaped.
#[must_use]
pub fn render_message(entry: &Interesting) -> String {
    let item = &entry.item;
    let style = if entry.is_favorite { FAVORITE_STYLE } else { "" };

    let mut lines = Vec::with_capacity(7);
    if let Some(link) = &item.link {
        lines.push(link.clone());
    }
    lines.push(format!("{FENCE}{style}"));
    lines.push(format!("| ID: {}", item.id));
    lines.push(format!(
        "| TITLE: {}",
        item.title.as_deref().unwrap_or(ABSENT)
    ));
    lines.push(format!(
        "| PRICE: {}",
        item.price.as_deref().unwrap_or(ABSENT)
    ));
    lines.push(format!("| STOCK: {}", render_stocks(&entry.display_stocks)));
    lines.push(FENCE.to_string());
    lines.join("\n")
}

/// `location: quantity` pairs joined by `", "`.
#[must_use]
pub fn render_stocks(stocks: &[(String, String)]) -> String {
    stocks
        .iter()
        .map(|(location, quantity)| format!("{location}: {quantity}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    fn entry(is_favorite: bool, link: Option<&str>) -> Interesting {
        Interesting {
            item: Item {
                id: "ABC1234567".to_string(),
                title: Some("Graphics Card".to_string()),
                price: Some("$999.99".to_string()),
                link: link.map(str::to_string),
                stocks: vec![],
                is_in_stock: true,
            },
            display_stocks: vec![
                ("B".to_string(), "2".to_string()),
                ("A".to_string(), "1".to_string()),
            ],
            is_favorite,
        }
    }

    #[test]
    fn renders_plain_message() {
        let msg = render_message(&entry(false, Some("https://shop.example/p/1")));
        assert_eq!(
            msg,
            "https://shop.example/p/1\n```\n| ID: ABC1234567\n| TITLE: Graphics Card\n| PRICE: $999.99\n| STOCK: B: 2, A: 1\n```"
        );
    }

    #[test]
    fn favorite_uses_highlight_style() {
        let msg = render_message(&entry(true, Some("https://shop.example/p/1")));
        assert!(msg.contains("\n```fix\n"), "got: {msg}");
    }

    #[test]
    fn missing_link_and_fields() {
        let mut e = entry(false, None);
        e.item.title = None;
        e.item.price = None;
        let msg = render_message(&e);
        assert!(msg.starts_with("```\n"), "got: {msg}");
        assert!(msg.contains("| TITLE: n/a"));
        assert!(msg.contains("| PRICE: n/a"));
    }

    #[test]
    fn stock_markup_is_not_escaped() {
        let stocks = vec![("StoreA".to_string(), "<strong>-</strong>".to_string())];
        assert_eq!(render_stocks(&stocks), "StoreA: <strong>-</strong>");
    }
}
