use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::element_text;
use crate::price::{parse_price_text, PriceToken};

/// Common storefront price classes, tried in order.
const PRICE_SELECTORS: [&str; 8] = [
    ".price",
    ".preco",
    ".product-price",
    ".valor",
    ".price--main",
    ".product-price__price",
    ".price-amount",
    ".priceValue",
];

static COMPILED: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    PRICE_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("valid price selector"))
        .collect()
});

/// First element of the first selector whose text parses as a price.
pub(super) fn selector_price(document: &Html) -> Option<PriceToken> {
    COMPILED.iter().find_map(|selector| {
        document
            .select(selector)
            .find_map(|el| parse_price_text(&element_text(el)))
    })
}
