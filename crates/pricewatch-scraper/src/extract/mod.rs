//! Product name, price and currency extraction from raw HTML.
//!
//! [`extract`] never fails. The price comes from the first cascade step that
//! yields a parseable amount, in this order: microdata, CSS selectors,
//! `product:price:*` meta tags, JSON-LD, then a currency-prefixed scan of the
//! visible text.

mod jsonld;
mod meta;
mod microdata;
mod selectors;
mod text_scan;

use std::sync::LazyLock;

use pricewatch_core::{PriceSource, ProductSnapshot, UNTITLED};
use scraper::{ElementRef, Html, Selector};

use crate::price::PriceToken;

/// Only this many bytes of a page are parsed.
pub const MAX_HTML_BYTES: usize = 2 * 1024 * 1024;

type Strategy = fn(&Html) -> Option<PriceToken>;

const PRICE_CASCADE: [(PriceSource, Strategy); 5] = [
    (PriceSource::Microdata, microdata::microdata_price),
    (PriceSource::Selector, selectors::selector_price),
    (PriceSource::MetaTag, meta::meta_price),
    (PriceSource::JsonLd, jsonld::jsonld_price),
    (PriceSource::TextScan, text_scan::text_scan_price),
];

static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"], meta[name="og:title"]"#)
        .expect("valid og:title selector")
});

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

/// Currency declared anywhere on the page, used when the winning strategy
/// found an amount without one.
static DECLARED_CURRENCY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[itemprop="priceCurrency"], meta[property="product:price:currency"], meta[name="product:price:currency"], meta[property="og:price:currency"], meta[name="og:price:currency"]"#,
    )
    .expect("valid currency selector")
});

/// Extract a [`ProductSnapshot`] from `html`.
#[must_use]
pub fn extract(html: &str) -> ProductSnapshot {
    let document = Html::parse_document(truncate_html(html));
    let name = extract_name(&document);

    for (source, strategy) in PRICE_CASCADE {
        match strategy(&document) {
            Some(token) => {
                let currency = token.currency.or_else(|| declared_currency(&document));
                tracing::debug!(
                    %source,
                    price = token.amount,
                    currency = currency.as_deref().unwrap_or("unknown"),
                    "price extracted"
                );
                return ProductSnapshot {
                    name,
                    price: Some(token.amount),
                    currency,
                    source: Some(source),
                };
            }
            None => tracing::debug!(%source, "price strategy found nothing"),
        }
    }

    ProductSnapshot {
        name,
        price: None,
        currency: None,
        source: None,
    }
}

/// `og:title`, then `<title>`, then [`UNTITLED`].
fn extract_name(document: &Html) -> String {
    document
        .select(&OG_TITLE)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
        .or_else(|| {
            document
                .select(&TITLE)
                .map(element_text)
                .find(|s| !s.is_empty())
        })
        .unwrap_or_else(|| UNTITLED.to_owned())
}

fn declared_currency(document: &Html) -> Option<String> {
    document
        .select(&DECLARED_CURRENCY)
        .find_map(|el| attr_or_text(el, "content"))
}

/// Cut `html` to [`MAX_HTML_BYTES`] on a char boundary.
fn truncate_html(html: &str) -> &str {
    if html.len() <= MAX_HTML_BYTES {
        return html;
    }
    let mut end = MAX_HTML_BYTES;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    &html[..end]
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Non-empty `attr` value, else the element's non-empty text.
pub(crate) fn attr_or_text(el: ElementRef<'_>, attr: &str) -> Option<String> {
    el.value()
        .attr(attr)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .or_else(|| Some(element_text(el)).filter(|s| !s.is_empty()))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
